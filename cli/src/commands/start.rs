//! `vbmc start`: enable BMC endpoints.

use std::process::ExitCode;

use anyhow::Result;
use vbmc_common::ControlRequest;

use crate::app::AppContext;
use crate::commands::{DomainNames, execute};

/// Run `vbmc start`.
///
/// # Errors
///
/// Returns an error if the control plane cannot be reached.
pub async fn run(app: &AppContext, args: DomainNames) -> Result<ExitCode> {
    let done = format!("Started {}", args.domain_names.join(", "));
    let request = ControlRequest::Start {
        domain_names: args.domain_names,
    };
    execute(app, &request, &done).await
}
