//! Pid file lock guarding the entry store against a second daemon.
//!
//! The file holds a plain decimal pid. It is written in full to a temp file
//! in the same directory and then hard-linked into place; linking fails when
//! the target exists, so of two racing daemons exactly one claims it. The
//! file is removed again when the lock is dropped. A file whose pid no longer
//! names a live process is stale and is replaced.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tempfile::NamedTempFile;
use vbmc_common::FleetError;

/// Stale-file removals tolerated before giving up on a contended path.
const CLAIM_ATTEMPTS: usize = 5;

/// Held for the lifetime of the daemon.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    pid: u32,
}

impl PidLock {
    /// Claim `path` for the current process.
    ///
    /// # Errors
    ///
    /// `FleetError::Lock` when another live process owns the file, or an
    /// I/O error when it cannot be written.
    pub fn acquire(path: &Path) -> Result<Self> {
        let pid = std::process::id();
        let temp = write_temp(path, &format!("{pid}\n"))?;
        claim(temp.path(), path)?;
        Ok(Self {
            path: path.to_path_buf(),
            pid,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        // Leave a file that a newer daemon has since claimed.
        if read_pid(&self.path) == Some(self.pid) {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Pid stored in `path`, if the file exists and parses.
#[must_use]
pub fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Pid stored in `path` when that process is still alive.
#[must_use]
pub fn live_owner(path: &Path) -> Option<u32> {
    read_pid(path).filter(|pid| is_pid_running(*pid))
}

/// Non-destructive liveness probe (signal 0).
#[must_use]
pub fn is_pid_running(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Fully written pid file next to `path`, deleted when dropped.
fn write_temp(path: &Path, content: &str) -> Result<NamedTempFile> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating directory {}", parent.display()))?;
    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temp file in {}", parent.display()))?;
    temp.write_all(content.as_bytes())
        .and_then(|()| temp.flush())
        .with_context(|| format!("writing temp file {}", temp.path().display()))?;
    Ok(temp)
}

/// Link `temp` to `path` unless a live process already owns `path`.
fn claim(temp: &Path, path: &Path) -> Result<()> {
    for _ in 0..CLAIM_ATTEMPTS {
        match std::fs::hard_link(temp, path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| format!("creating pid file {}", path.display()));
            }
        }

        let seen = std::fs::read_to_string(path).ok();
        let owner = seen
            .as_deref()
            .and_then(|text| text.trim().parse::<u32>().ok())
            .filter(|pid| is_pid_running(*pid));
        if let Some(pid) = owner {
            return Err(FleetError::Lock(format!("server PID #{pid} still running")).into());
        }
        // Only remove the stale file we inspected, not one a rival just linked.
        if seen.is_some() && std::fs::read_to_string(path).ok() == seen {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::info!(path = %path.display(), "replaced stale pid file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("removing stale pid file {}", path.display()));
                }
            }
        }
    }
    Err(FleetError::Lock(format!("pid file {} is contended", path.display())).into())
}
