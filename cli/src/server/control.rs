//! The control server event loop.
//!
//! One task, one request at a time: accept a connection, read one frame,
//! dispatch it, reply, close. When no connection arrives within the tick
//! interval the fleet manager runs a convergence pass instead. Commands and
//! ticks therefore never overlap.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use vbmc_common::ControlResponse;

use crate::application::ports::{EntryStore, HypervisorAdapter, WorkerSupervisor};
use crate::application::services::fleet::FleetManager;
use crate::domain::VbmcConfig;
use crate::infra::codec::{Decoded, decode_request, read_frame, write_frame};
use crate::server::dispatch::dispatch;

/// Loop timing.
#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
    /// Idle time before a convergence pass.
    pub tick: Duration,
    /// Bound on reading one request and writing its reply.
    pub io_timeout: Duration,
}

impl From<&VbmcConfig> for ServerSettings {
    fn from(config: &VbmcConfig) -> Self {
        Self {
            tick: config.tick_interval(),
            io_timeout: config.response_timeout(),
        }
    }
}

/// Bind the control endpoint on loopback.
///
/// # Errors
///
/// Returns an error if the port cannot be bound.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind control endpoint {addr}"))
}

/// Control endpoint plus the fleet manager it drives.
pub struct ControlServer<S, W: WorkerSupervisor, H> {
    listener: TcpListener,
    manager: FleetManager<S, W, H>,
    settings: ServerSettings,
}

impl<S, W, H> ControlServer<S, W, H>
where
    S: EntryStore,
    W: WorkerSupervisor,
    H: HypervisorAdapter,
{
    pub fn new(listener: TcpListener, manager: FleetManager<S, W, H>, settings: ServerSettings) -> Self {
        Self {
            listener,
            manager,
            settings,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("reading control endpoint address")
    }

    /// Serve until `shutdown` resolves, then stop every worker.
    ///
    /// Runs one convergence pass before accepting the first request so
    /// entries left enabled by a previous run come back up. Returns the
    /// fleet manager after the final drain.
    pub async fn serve_until<F>(mut self, shutdown: F) -> FleetManager<S, W, H>
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = self.local_addr() {
            tracing::info!(port = addr.port(), "control server listening");
        }
        self.manager.periodic(false).await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = tokio::time::timeout(self.settings.tick, self.listener.accept()) => {
                    match accepted {
                        Err(_idle) => self.manager.periodic(false).await,
                        Ok(Ok((stream, peer))) => self.handle(stream, peer).await,
                        Ok(Err(e)) => tracing::warn!(error = %e, "accept failed"),
                    }
                }
            }
        }

        tracing::info!("draining workers before exit");
        self.manager.periodic(true).await;
        self.manager
    }

    async fn handle(&mut self, stream: TcpStream, peer: SocketAddr) {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let frame = match tokio::time::timeout(self.settings.io_timeout, read_frame(&mut reader)).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => {
                tracing::warn!(%peer, error = %e, "dropping request");
                return;
            }
            Err(_) => {
                tracing::warn!(%peer, "timed out reading request");
                return;
            }
        };

        let response = match decode_request(&frame) {
            Ok(Decoded::Request(request)) => {
                tracing::debug!(command = request.name(), request = ?request, "request");
                dispatch(&mut self.manager, request).await
            }
            Ok(Decoded::Unknown(command)) => {
                tracing::warn!(%command, "unknown command");
                ControlResponse::failure("Unknown command")
            }
            Err(e) => {
                tracing::warn!(%peer, error = %e, "dropping malformed request");
                return;
            }
        };
        tracing::debug!(rc = response.rc, msg = ?response.msg, "response");

        match tokio::time::timeout(self.settings.io_timeout, write_frame(&mut write_half, &response)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(%peer, error = %e, "failed to send reply"),
            Err(_) => tracing::warn!(%peer, "timed out sending reply"),
        }
    }
}
