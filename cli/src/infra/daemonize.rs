//! Detaching the control plane from the invoking terminal.
//!
//! The daemon never forks. The launching process re-executes itself with
//! `--foreground --detached` and null stdio, waits a moment to see that the
//! child survived start-up, and exits. The child then leaves the session.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use nix::sys::stat::{Mode, umask};
use nix::unistd::setsid;

use crate::domain::DaemonError;

/// Start a detached copy of the current executable and return its pid.
///
/// # Errors
///
/// Returns an error if the child cannot be spawned or has already exited
/// once `spawn_wait` has passed.
pub async fn spawn_detached(config: Option<&Path>, spawn_wait: Duration) -> Result<u32> {
    let exe = std::env::current_exe().context("locating the vbmcd executable")?;
    let mut command = Command::new(exe);
    command
        .args(["--foreground", "--detached"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(path) = config {
        // The child changes directory to `/`.
        let path = std::path::absolute(path)
            .with_context(|| format!("resolving {}", path.display()))?;
        command.arg("--config").arg(path);
    }
    let mut child = command.spawn().context("failed to start detached vbmcd")?;

    tokio::time::sleep(spawn_wait).await;
    if let Some(status) = child.try_wait().context("checking detached vbmcd")? {
        return Err(DaemonError::DetachedExited {
            status: status.to_string(),
        }
        .into());
    }
    Ok(child.id())
}

/// Leave the controlling terminal's session, release the working
/// directory, and reset the file creation mask.
///
/// # Errors
///
/// Returns an error if any of the three steps fails.
pub fn detach_session() -> Result<()> {
    setsid().context("failed to start a new session")?;
    std::env::set_current_dir("/").context("failed to change root directory")?;
    umask(Mode::from_bits_truncate(0o022));
    Ok(())
}
