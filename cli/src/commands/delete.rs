//! `vbmc delete`: remove BMC endpoints and their records.

use std::process::ExitCode;

use anyhow::Result;
use vbmc_common::ControlRequest;

use crate::app::AppContext;
use crate::commands::{DomainNames, execute};

/// Run `vbmc delete`.
///
/// # Errors
///
/// Returns an error if the control plane cannot be reached.
pub async fn run(app: &AppContext, args: DomainNames) -> Result<ExitCode> {
    let done = format!("Deleted {}", args.domain_names.join(", "));
    let request = ControlRequest::Delete {
        domain_names: args.domain_names,
    };
    execute(app, &request, &done).await
}
