//! Configuration schema for the fleet manager and its control client.
//!
//! Pure types only. Locating and reading the file lives in `infra::config`.
//! One `VbmcConfig` is built at startup and handed to every component that
//! needs it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_SERVER_PORT: u16 = 50891;
const DEFAULT_CONFIG_DIR: &str = "~/.vbmc";
const DEFAULT_PID_FILE: &str = "~/.vbmc/master.pid";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration, stored as YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VbmcConfig {
    /// Server and store settings.
    #[serde(rename = "default")]
    pub server: ServerConfig,
    /// Log destination and verbosity.
    pub log: LogConfig,
    /// Settings handed through to each worker.
    pub ipmi: IpmiConfig,
}

/// The `default` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory holding one sub-directory per domain.
    pub config_dir: PathBuf,
    /// Lock file with the pid of the running server.
    pub pid_file: PathBuf,
    /// Loopback TCP port of the control channel.
    pub server_port: u16,
    /// Show passwords in `show`/`list` output and in logs.
    #[serde(deserialize_with = "flexible_bool")]
    pub show_passwords: bool,
    /// Milliseconds the client waits for a reply.
    pub server_response_timeout: u64,
    /// Milliseconds a daemonizing parent waits for the server to settle.
    pub server_spawn_wait: u64,
    /// Milliseconds between idle convergence passes.
    pub tick_interval: u64,
    /// Milliseconds between SIGTERM and SIGKILL when stopping a worker.
    pub worker_stop_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
            server_port: DEFAULT_SERVER_PORT,
            show_passwords: false,
            server_response_timeout: 5000,
            server_spawn_wait: 3000,
            tick_interval: 3000,
            worker_stop_timeout: 2000,
        }
    }
}

/// The `log` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Append logs to this file instead of stderr.
    pub logfile: Option<PathBuf>,
    /// Log at debug level.
    #[serde(deserialize_with = "flexible_bool")]
    pub debug: bool,
}

/// The `ipmi` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpmiConfig {
    /// Seconds a worker waits for data on an idle session.
    pub session_timeout: u64,
}

impl Default for IpmiConfig {
    fn default() -> Self {
        Self { session_timeout: 1 }
    }
}

fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Text(s) => vbmc_common::parse_bool(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("Value \"{s}\" can not be interpreted as boolean"))
        }),
    }
}

// ── Accessors ────────────────────────────────────────────────────────────────

impl VbmcConfig {
    /// Replace a leading `~` in every path setting with `home`.
    #[must_use]
    pub fn expand_home(mut self, home: &Path) -> Self {
        self.server.config_dir = expand(&self.server.config_dir, home);
        self.server.pid_file = expand(&self.server.pid_file, home);
        self.log.logfile = self.log.logfile.map(|p| expand(&p, home));
        self
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.server.tick_interval)
    }

    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.server.server_response_timeout)
    }

    /// Budget for the hypervisor probe made while serving `add`.
    ///
    /// Four fifths of the reply window, so a slow hypervisor still yields a
    /// connection error before the client gives up waiting.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis((self.server.server_response_timeout * 4 / 5).max(1))
    }

    #[must_use]
    pub fn spawn_wait(&self) -> Duration {
        Duration::from_millis(self.server.server_spawn_wait)
    }

    #[must_use]
    pub fn worker_stop_timeout(&self) -> Duration {
        Duration::from_millis(self.server.worker_stop_timeout)
    }

    /// Check value ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero port or a zero duration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.server_port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "default.server_port",
                value: "0".to_string(),
                expected: "a port between 1 and 65535",
            });
        }
        let durations = [
            ("default.server_response_timeout", self.server.server_response_timeout),
            ("default.server_spawn_wait", self.server.server_spawn_wait),
            ("default.tick_interval", self.server.tick_interval),
            ("default.worker_stop_timeout", self.server.worker_stop_timeout),
            ("ipmi.session_timeout", self.ipmi.session_timeout),
        ];
        for (key, value) in durations {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: value.to_string(),
                    expected: "a positive number",
                });
            }
        }
        Ok(())
    }
}

fn expand(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
