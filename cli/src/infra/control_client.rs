//! Client side of the control channel.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use vbmc_common::{ControlRequest, ControlResponse};

use crate::infra::codec::{read_frame, write_frame};

/// The control plane could not be reached or did not answer.
///
/// Distinct from a reply with a non-zero `rc`, which is a rejection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not reach the control plane at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("control plane at {addr} did not answer within {} ms", .timeout.as_millis())]
    Timeout { addr: SocketAddr, timeout: Duration },

    #[error("malformed reply from the control plane: {0}")]
    Malformed(String),

    #[error("control channel failed: {0}")]
    Io(#[from] io::Error),
}

/// Sends one request per connection to the local control server.
pub struct ControlClient {
    addr: SocketAddr,
    timeout: Duration,
}

impl ControlClient {
    #[must_use]
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            timeout,
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send `request` and wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` when the server is unreachable, silent
    /// past the timeout, or answers with something that is not a response.
    pub async fn send(&self, request: &ControlRequest) -> Result<ControlResponse, TransportError> {
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| TransportError::Timeout {
                addr: self.addr,
                timeout: self.timeout,
            })?
    }

    async fn exchange(&self, request: &ControlRequest) -> Result<ControlResponse, TransportError> {
        let stream = TcpStream::connect(self.addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: self.addr,
                source,
            })?;
        let (read_half, mut write_half) = stream.into_split();
        write_frame(&mut write_half, request).await?;

        let mut reader = BufReader::new(read_half);
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(TransportError::Malformed(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&frame).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
