//! Typed domain error enums.
//!
//! Fleet operation failures live in `vbmc_common::FleetError`; this module
//! covers what can go wrong before the fleet manager exists.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

// ── Daemon errors ─────────────────────────────────────────────────────────────

/// Errors raised while detaching the control-plane process.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("vBMC server did not come up: detached process exited with {status}")]
    DetachedExited { status: String },
}
