//! Control channel framing: one JSON document per line.

use std::io;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use vbmc_common::{ControlRequest, FleetError, KNOWN_COMMANDS};

/// Largest accepted frame, newline excluded.
pub const MAX_FRAME: usize = 64 * 1024;

/// Read one newline-terminated frame.
///
/// A final frame without a newline is accepted when the peer closes its
/// side.
///
/// # Errors
///
/// `InvalidData` for an oversize frame, `UnexpectedEof` when the peer closes
/// before sending anything, or the underlying I/O error.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let limit = u64::try_from(MAX_FRAME + 1).unwrap_or(u64::MAX);
    reader.take(limit).read_until(b'\n', &mut buf).await?;
    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > MAX_FRAME {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame exceeds {MAX_FRAME} bytes"),
        ));
    } else if buf.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before a frame was sent",
        ));
    }
    Ok(buf)
}

/// Serialize `message` and write it as one frame.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut bytes = serde_json::to_vec(message).map_err(io::Error::other)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await
}

/// A request frame, decoded.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    Request(ControlRequest),
    /// Well-formed JSON naming a command the server does not know.
    Unknown(String),
}

/// Decode a request frame.
///
/// # Errors
///
/// `FleetError::Protocol` for anything that is not a JSON object with a
/// string `command`, or a known command with missing or invalid fields.
pub fn decode_request(frame: &[u8]) -> Result<Decoded, FleetError> {
    let value: Value =
        serde_json::from_slice(frame).map_err(|e| FleetError::Protocol(e.to_string()))?;
    let command = value
        .get("command")
        .and_then(Value::as_str)
        .ok_or_else(|| FleetError::Protocol("missing \"command\" field".to_string()))?;
    if !KNOWN_COMMANDS.contains(&command) {
        return Ok(Decoded::Unknown(command.to_string()));
    }
    serde_json::from_value(value)
        .map(Decoded::Request)
        .map_err(|e| FleetError::Protocol(e.to_string()))
}
