//! Payload a fleet manager hands a freshly spawned worker on stdin.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vbmc_common::BmcEntry;

use crate::domain::config::VbmcConfig;

/// Everything a worker needs to serve one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerLaunch {
    pub entry: BmcEntry,
    #[serde(default)]
    pub logfile: Option<PathBuf>,
    #[serde(default)]
    pub debug: bool,
    pub session_timeout: u64,
    #[serde(default)]
    pub show_passwords: bool,
}

impl WorkerLaunch {
    #[must_use]
    pub fn new(entry: BmcEntry, config: &VbmcConfig) -> Self {
        Self {
            entry,
            logfile: config.log.logfile.clone(),
            debug: config.log.debug,
            session_timeout: config.ipmi.session_timeout,
            show_passwords: config.server.show_passwords,
        }
    }
}
