//! JSON output helpers.
//!
//! `--json` prints the control reply exactly as received, pretty-printed.

use anyhow::{Context, Result};
use vbmc_common::ControlResponse;

/// Format a control reply for `--json`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_response(response: &ControlResponse) -> Result<String> {
    serde_json::to_string_pretty(response).context("JSON serialization failed")
}

/// Format a transport failure for `--json`.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "transport"
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
