//! Command implementations
//!
//! Every subcommand sends exactly one request and renders the reply. A reply
//! with a non-zero `rc` is a rejection: its messages go to stderr and the
//! process exits 1. Failing to reach the server at all is an error.

pub mod add;
pub mod delete;
pub mod list;
pub mod show;
pub mod start;
pub mod stop;

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use vbmc_common::{ControlRequest, ControlResponse};

use crate::app::AppContext;
use crate::output::json;

/// Domain names for the batch commands.
#[derive(Args)]
pub struct DomainNames {
    /// Names of the domains
    #[arg(required = true, value_name = "DOMAIN_NAME")]
    pub domain_names: Vec<String>,
}

/// Send `request` and render its reply.
///
/// `done` is printed on success unless the reply is a table.
///
/// # Errors
///
/// Returns the transport error when the control plane cannot be reached.
pub async fn execute(app: &AppContext, request: &ControlRequest, done: &str) -> Result<ExitCode> {
    let response = match app.client.send(request).await {
        Ok(response) => response,
        Err(e) if app.is_json() => {
            println!("{}", json::format_error(&e.to_string(), "transport")?);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };
    report(app, &response, done)
}

/// Render a reply and pick the exit code from its `rc`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn report(app: &AppContext, response: &ControlResponse, done: &str) -> Result<ExitCode> {
    if app.is_json() {
        println!("{}", json::format_response(response)?);
    } else if !response.is_success() {
        for msg in &response.msg {
            app.output.error(msg);
        }
    } else if response.header.is_some() {
        app.output.table(response);
    } else {
        app.output.success(done);
    }

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
