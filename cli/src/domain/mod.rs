//! Domain layer: pure types, rules, and validation.
//!
//! Nothing here touches `crate::infra`, `tokio`, `std::fs`, `std::process`,
//! or `std::net`. All functions are synchronous and take data in, returning
//! data out.

pub mod batch;
pub mod bmc;
pub mod config;
pub mod convergence;
pub mod error;
pub mod launch;

pub use bmc::{BmcView, LIST_HEADER, SHOW_HEADER};
pub use config::VbmcConfig;
pub use convergence::{Action, Observed, decide};
pub use error::{ConfigError, DaemonError};
pub use launch::WorkerLaunch;
