//! Tracing subscriber setup shared by the daemon and its workers.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::domain::config::LogConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `debug` or `info`
/// depending on `log.debug`. Output goes to `log.logfile` (appended, no
/// colours) or to stderr.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_tracing(log: &LogConfig) -> Result<()> {
    let default_level = if log.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match &log.logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    // A subscriber already installed (tests, re-entry) is fine.
    if let Err(e) = installed {
        tracing::debug!("tracing subscriber already set: {e}");
    }
    Ok(())
}
