//! `vbmc list`: table of every endpoint and its status.

use std::process::ExitCode;

use anyhow::Result;
use vbmc_common::ControlRequest;

use crate::app::AppContext;
use crate::commands::execute;

/// Run `vbmc list`.
///
/// # Errors
///
/// Returns an error if the control plane cannot be reached.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    execute(app, &ControlRequest::List, "").await
}
