//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` and `vbmc_common`, never on
//! `crate::infra`, `crate::server`, `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    CommandRunner, DomainRef, EntryStore, HypervisorAdapter, HypervisorConnection,
    WorkerSupervisor, check_connection_and_domain,
};
