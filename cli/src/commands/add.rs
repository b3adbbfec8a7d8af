//! `vbmc add`: register a new BMC endpoint.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use vbmc_common::{AddRequest, ControlRequest, HypervisorAuth};

use crate::app::AppContext;
use crate::commands::execute;

/// Arguments for the add command.
#[derive(Args)]
pub struct AddArgs {
    /// Name of the hypervisor domain to manage
    pub domain_name: String,

    /// BMC username
    #[arg(long, default_value = "admin")]
    pub username: String,

    /// BMC password
    #[arg(long, default_value = "password")]
    pub password: String,

    /// UDP port the BMC listens on
    #[arg(long, default_value_t = 623)]
    pub port: u16,

    /// Address the BMC binds to
    #[arg(long, default_value = "::")]
    pub address: String,

    /// Hypervisor connection URI
    #[arg(long, default_value = "qemu:///system")]
    pub hypervisor_uri: String,

    /// SASL username for the hypervisor connection
    #[arg(long)]
    pub auth_username: Option<String>,

    /// SASL password for the hypervisor connection
    #[arg(long)]
    pub auth_password: Option<String>,
}

impl AddArgs {
    /// Build the wire request, rejecting half an auth pair before sending.
    ///
    /// # Errors
    ///
    /// Returns an error when only one of the auth flags is given.
    pub fn into_request(self) -> Result<ControlRequest> {
        HypervisorAuth::from_parts(self.auth_username.clone(), self.auth_password.clone())?;
        Ok(ControlRequest::Add(AddRequest {
            domain_name: self.domain_name,
            username: self.username,
            password: self.password,
            port: self.port,
            address: self.address,
            hypervisor_uri: self.hypervisor_uri,
            auth_username: self.auth_username,
            auth_password: self.auth_password,
        }))
    }
}

/// Run `vbmc add`.
///
/// # Errors
///
/// Returns an error for invalid arguments or an unreachable control plane.
pub async fn run(app: &AppContext, args: AddArgs) -> Result<ExitCode> {
    let done = format!("Added {}", args.domain_name);
    let request = args.into_request()?;
    execute(app, &request, &done).await
}
