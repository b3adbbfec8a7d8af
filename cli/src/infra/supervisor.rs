//! Infrastructure implementation of the `WorkerSupervisor` port.
//!
//! Each worker is a child process (by default `vbmcd _worker`) that reads
//! its launch payload as JSON from stdin. Workers get their own process
//! group so a signal aimed at the daemon's group never reaches them; the
//! supervisor is the only thing that stops them.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use vbmc_common::BmcEntry;

use crate::application::ports::WorkerSupervisor;
use crate::domain::{VbmcConfig, WorkerLaunch};

/// Hidden subcommand that turns `vbmcd` into a worker.
pub const WORKER_SUBCOMMAND: &str = "_worker";

/// One spawned worker process.
pub struct WorkerHandle {
    domain_name: String,
    child: Child,
    pid: Option<u32>,
    exit: Option<i32>,
}

impl WorkerHandle {
    /// Cached exit code, refreshed with a non-blocking reap.
    fn poll_exit(&mut self) -> Option<i32> {
        if self.exit.is_none() {
            match self.child.try_wait() {
                Ok(Some(status)) => self.exit = Some(exit_code(status)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(domain = %self.domain_name, error = %e, "cannot poll worker, treating it as exited");
                    self.exit = Some(-1);
                }
            }
        }
        self.exit
    }
}

/// Exit code, or the negated signal number for a signalled process.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    status.code().unwrap_or(-1)
}

/// Spawns workers as child processes of the daemon.
pub struct ProcessSupervisor {
    program: PathBuf,
    args: Vec<String>,
    config: VbmcConfig,
}

impl ProcessSupervisor {
    /// Supervisor that re-runs the current executable as a worker.
    ///
    /// # Errors
    ///
    /// Returns an error if the current executable cannot be determined.
    pub fn from_config(config: &VbmcConfig) -> Result<Self> {
        let program = std::env::current_exe().context("locating the vbmcd executable")?;
        Ok(Self::with_program(
            program,
            vec![WORKER_SUBCOMMAND.to_string()],
            config,
        ))
    }

    /// Supervisor that runs an arbitrary program as the worker.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>, args: Vec<String>, config: &VbmcConfig) -> Self {
        Self {
            program: program.into(),
            args,
            config: config.clone(),
        }
    }

    fn stop_timeout(&self) -> Duration {
        self.config.worker_stop_timeout()
    }
}

impl WorkerSupervisor for ProcessSupervisor {
    type Handle = WorkerHandle;

    async fn spawn(&self, entry: &BmcEntry) -> Result<WorkerHandle> {
        let launch = WorkerLaunch::new(entry.clone(), &self.config);
        let payload = serde_json::to_vec(&launch).context("serializing worker launch payload")?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload).await {
                // The worker may exit before reading; that shows up as `error`.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                result => result.context("writing worker launch payload")?,
            }
        }

        Ok(WorkerHandle {
            domain_name: entry.domain_name.clone(),
            pid: child.id(),
            child,
            exit: None,
        })
    }

    fn is_alive(&self, handle: &mut WorkerHandle) -> bool {
        handle.poll_exit().is_none()
    }

    async fn terminate(&self, handle: &mut WorkerHandle) -> Result<()> {
        if handle.poll_exit().is_some() {
            return Ok(());
        }
        if let Some(pid) = handle.pid {
            let pid = i32::try_from(pid).context("worker pid out of range")?;
            match kill(Pid::from_raw(pid), Signal::SIGTERM) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("signalling worker {pid}"));
                }
            }
        }

        match tokio::time::timeout(self.stop_timeout(), handle.child.wait()).await {
            Ok(status) => {
                let status = status.context("waiting for worker")?;
                handle.exit = Some(exit_code(status));
            }
            Err(_) => {
                tracing::warn!(domain = %handle.domain_name, pid = ?handle.pid, "worker ignored SIGTERM, killing");
                handle.child.kill().await.context("killing worker")?;
                handle.exit = handle.child.try_wait().ok().flatten().map(exit_code);
            }
        }
        Ok(())
    }

    fn exit_status(&self, handle: &mut WorkerHandle) -> Option<i32> {
        handle.poll_exit()
    }

    fn pid(&self, handle: &WorkerHandle) -> Option<u32> {
        handle.pid
    }
}
