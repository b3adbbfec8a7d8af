//! Error taxonomy for fleet operations.
//!
//! Every variant maps to a non-zero result code on the control channel; the
//! `Display` text is what ends up in the response `msg` list.

use thiserror::Error;

/// Result code reported for a successful command.
pub const RC_OK: i32 = 0;

/// Result code reported for any failed command.
pub const RC_FAILED: i32 = 1;

/// Errors raised by the fleet manager and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    #[error("No domain with matching name {0} was found")]
    NotFound(String),

    #[error("Domain {0} already exists")]
    AlreadyExists(String),

    #[error("Fail to establish a connection with hypervisor URI \"{uri}\". Error: {reason}")]
    Connection { uri: String, reason: String },

    #[error("Failed to persist configuration for domain {domain}. Error: {reason}")]
    Persistence { domain: String, reason: String },

    #[error("Failed to start worker for domain {domain}. Error: {reason}")]
    Spawn { domain: String, reason: String },

    #[error("Malformed control message: {0}")]
    Protocol(String),

    #[error("{0}")]
    Lock(String),

    #[error("{0}")]
    Validation(String),
}

impl FleetError {
    /// Build a persistence error from any displayable cause.
    pub fn persistence(domain: &str, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            domain: domain.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Result code this error is reported with on the control channel.
    #[must_use]
    pub const fn rc(&self) -> i32 {
        RC_FAILED
    }
}
