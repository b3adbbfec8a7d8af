//! `vbmcd` argument parsing and bootstrap.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal::unix::{SignalKind, signal};
use vbmc_common::FleetError;

use crate::application::services::fleet::FleetManager;
use crate::domain::VbmcConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigLoader;
use crate::infra::daemonize::{detach_session, spawn_detached};
use crate::infra::entry_store::FileEntryStore;
use crate::infra::hypervisor::VirshHypervisor;
use crate::infra::pidfile::{PidLock, live_owner};
use crate::infra::supervisor::ProcessSupervisor;
use crate::infra::telemetry::init_tracing;
use crate::server::{ControlServer, ServerSettings, bind};
use crate::worker;

/// Virtual BMC control-plane daemon
#[derive(Parser)]
#[command(name = "vbmcd", version)]
pub struct DaemonCli {
    /// Configuration file (overrides $VIRTUALBMC_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stay attached to the terminal
    #[arg(long)]
    pub foreground: bool,

    /// Set by the launching process on its detached copy
    #[arg(long, hide = true)]
    pub detached: bool,

    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Run one BMC endpoint; launched by the daemon itself
    #[command(hide = true, name = "_worker")]
    Worker,
}

impl DaemonCli {
    /// Run the daemon, a detaching launcher, or a worker.
    ///
    /// # Errors
    ///
    /// Returns an error when configuration, the pid lock, or the control
    /// endpoint cannot be set up.
    pub async fn run(self) -> Result<()> {
        if let Some(DaemonCommand::Worker) = self.command {
            return worker::run().await;
        }
        if self.detached {
            detach_session()?;
        }

        let config = YamlConfigLoader::new(self.config.clone()).load()?;

        if self.foreground {
            return serve(config).await;
        }

        // Fail in the terminal rather than in a detached child nobody watches.
        if let Some(pid) = live_owner(&config.server.pid_file) {
            return Err(FleetError::Lock(format!("server PID #{pid} still running")).into());
        }
        let pid = spawn_detached(self.config.as_deref(), config.spawn_wait()).await?;
        println!("vbmcd started, PID {pid}");
        Ok(())
    }
}

async fn serve(config: VbmcConfig) -> Result<()> {
    init_tracing(&config.log)?;
    let _lock = PidLock::acquire(&config.server.pid_file)?;
    let listener = bind(config.server.server_port).await?;

    let manager = FleetManager::new(
        FileEntryStore::new(&config.server.config_dir),
        ProcessSupervisor::from_config(&config)?,
        VirshHypervisor::new(TokioCommandRunner::new(config.probe_timeout())),
        config.server.show_passwords,
    )
    .with_probe_timeout(config.probe_timeout());
    let server = ControlServer::new(listener, manager, ServerSettings::from(&config));
    tracing::info!(
        pid = std::process::id(),
        port = config.server.server_port,
        config_dir = %config.server.config_dir.display(),
        "vbmcd starting"
    );

    let manager = server.serve_until(shutdown_signal()?).await;
    tracing::info!(workers = manager.tracked_workers().len(), "vbmcd stopped");
    Ok(())
}

/// Resolves on the first SIGTERM or SIGINT.
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut term = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut int = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    Ok(async move {
        tokio::select! {
            _ = term.recv() => tracing::info!("received SIGTERM"),
            _ = int.recv() => tracing::info!("received SIGINT"),
        }
    })
}
