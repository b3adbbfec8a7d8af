//! The per-domain worker process (`vbmcd _worker`).
//!
//! Reads its launch payload from stdin, binds the BMC endpoint, and serves
//! until the supervisor signals it. A bind failure exits non-zero, which the
//! fleet manager reports as `error`.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::net::UdpSocket;

use crate::application::services::domain_bmc::DomainBmc;
use crate::domain::WorkerLaunch;
use crate::domain::config::LogConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::hypervisor::VirshHypervisor;
use crate::infra::telemetry::init_tracing;

const MAX_DATAGRAM: usize = 1024;

/// Run a worker until it is terminated.
///
/// # Errors
///
/// Returns an error if the payload is unreadable, logging cannot start, or
/// the endpoint cannot be bound.
pub async fn run() -> Result<()> {
    let mut payload = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut payload)
        .await
        .context("reading worker launch payload")?;
    let launch: WorkerLaunch =
        serde_json::from_slice(&payload).context("parsing worker launch payload")?;

    init_tracing(&LogConfig {
        logfile: launch.logfile.clone(),
        debug: launch.debug,
    })?;

    let entry = &launch.entry;
    let shown = if launch.show_passwords {
        entry.clone()
    } else {
        entry.masked()
    };

    let socket = match UdpSocket::bind((entry.address.as_str(), entry.port)).await {
        Ok(socket) => socket,
        Err(e) => {
            tracing::error!(domain = %entry.domain_name, entry = ?shown, error = %e, "error running vBMC");
            return Err(e).with_context(|| {
                format!("cannot bind {}:{} for domain {}", entry.address, entry.port, entry.domain_name)
            });
        }
    };
    tracing::info!(
        domain = %entry.domain_name,
        address = %entry.address,
        port = entry.port,
        pid = std::process::id(),
        "vBMC worker listening"
    );

    let bmc = DomainBmc::new(VirshHypervisor::new(TokioCommandRunner::default()), entry);
    match bmc.get_power_state().await {
        Ok(state) => tracing::debug!(domain = %entry.domain_name, ?state, "initial power state"),
        Err(e) => tracing::warn!(domain = %entry.domain_name, error = %format!("{e:#}"), "cannot read power state"),
    }

    let session_timeout = Duration::from_secs(launch.session_timeout.max(1));
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        match tokio::time::timeout(session_timeout, socket.recv_from(&mut buf)).await {
            Err(_idle) => {}
            Ok(Ok((len, peer))) => {
                tracing::debug!(domain = %entry.domain_name, %peer, len, "ignoring management datagram");
            }
            Ok(Err(e)) => tracing::warn!(domain = %entry.domain_name, error = %e, "receive failed"),
        }
    }
}
