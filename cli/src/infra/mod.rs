//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! entry store, worker processes, the hypervisor CLI, the control channel
//! transport, and process bootstrap.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::server`, `crate::commands`, or `crate::output` are
//! forbidden.

pub mod codec;
pub mod command_runner;
pub mod config;
pub mod control_client;
pub mod daemonize;
pub mod entry_store;
pub mod hypervisor;
pub mod pidfile;
pub mod supervisor;
pub mod telemetry;
