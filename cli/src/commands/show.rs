//! `vbmc show`: properties of one endpoint.

use std::process::ExitCode;

use anyhow::Result;
use vbmc_common::ControlRequest;

use crate::app::AppContext;
use crate::commands::execute;

/// Run `vbmc show NAME`.
///
/// # Errors
///
/// Returns an error if the control plane cannot be reached.
pub async fn run(app: &AppContext, domain_name: String) -> Result<ExitCode> {
    execute(app, &ControlRequest::Show { domain_name }, "").await
}
