//! Infrastructure implementation of the `HypervisorAdapter` port.
//!
//! `VirshHypervisor` drives libvirt through the `virsh` CLI. Probes run with
//! `--readonly`. SASL credentials go through a throwaway libvirt auth file
//! named by `LIBVIRT_AUTH_FILE`, never through the command line.

use std::io::Write;
use std::process::Output;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use vbmc_common::{FleetError, HypervisorAuth};

use crate::application::ports::{CommandRunner, DomainRef, HypervisorAdapter, HypervisorConnection};

const VIRSH: &str = "virsh";
const AUTH_FILE_ENV: &str = "LIBVIRT_AUTH_FILE";

/// Hypervisor adapter backed by `virsh`.
pub struct VirshHypervisor<R> {
    runner: R,
}

impl<R: CommandRunner> VirshHypervisor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run `virsh` against the connection's URI.
    async fn virsh(&self, connection: &HypervisorConnection, args: &[&str]) -> Result<Output> {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 3);
        if connection.readonly {
            full.push("--readonly");
        }
        full.extend(["-c", connection.uri.as_str()]);
        full.extend_from_slice(args);

        // Keeps the auth file alive until virsh exits.
        let auth_file = connection.auth.as_ref().map(write_auth_file).transpose()?;
        match &auth_file {
            Some(file) => {
                let path = file.path().to_string_lossy().into_owned();
                self.runner
                    .run_with_env(VIRSH, &full, &[(AUTH_FILE_ENV, path.as_str())])
                    .await
            }
            None => self.runner.run(VIRSH, &full).await,
        }
    }

    /// Run a domain command and require success.
    async fn domain_command(&self, domain: &DomainRef, command: &str) -> Result<Output> {
        let output = self
            .virsh(&domain.connection, &[command, domain.name.as_str()])
            .await?;
        ensure_success(&output)
            .with_context(|| format!("virsh {command} {}", domain.name))?;
        Ok(output)
    }
}

fn ensure_success(output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    anyhow::bail!("{}", stderr_text(output))
}

fn stderr_text(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        format!("virsh exited with {}", output.status)
    } else {
        text
    }
}

/// libvirt client auth file answering SASL prompts for any host.
fn auth_file_contents(auth: &HypervisorAuth) -> String {
    format!(
        "[credentials-vbmc]\nauthname={}\npassword={}\n\n[auth-libvirt-default]\ncredentials=vbmc\n",
        auth.username, auth.password
    )
}

fn write_auth_file(auth: &HypervisorAuth) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("creating libvirt auth file")?;
    file.write_all(auth_file_contents(auth).as_bytes())
        .context("writing libvirt auth file")?;
    file.flush().context("writing libvirt auth file")?;
    Ok(file)
}

impl<R: CommandRunner> HypervisorAdapter for VirshHypervisor<R> {
    async fn connect(
        &self,
        uri: &str,
        auth: Option<&HypervisorAuth>,
        readonly: bool,
    ) -> Result<HypervisorConnection, FleetError> {
        let connection = HypervisorConnection {
            uri: uri.to_string(),
            auth: auth.cloned(),
            readonly,
        };
        let reason = match self.virsh(&connection, &["uri"]).await {
            Ok(output) if output.status.success() => return Ok(connection),
            Ok(output) => stderr_text(&output),
            Err(e) => format!("{e:#}"),
        };
        Err(FleetError::Connection {
            uri: uri.to_string(),
            reason,
        })
    }

    async fn lookup(
        &self,
        connection: &HypervisorConnection,
        domain_name: &str,
    ) -> Result<DomainRef, FleetError> {
        match self.virsh(connection, &["domuuid", domain_name]).await {
            Ok(output) if output.status.success() => Ok(DomainRef {
                connection: connection.clone(),
                name: domain_name.to_string(),
            }),
            Ok(_) => Err(FleetError::NotFound(domain_name.to_string())),
            Err(e) => Err(FleetError::Connection {
                uri: connection.uri.clone(),
                reason: format!("{e:#}"),
            }),
        }
    }

    async fn is_active(&self, domain: &DomainRef) -> Result<bool> {
        let output = self.domain_command(domain, "domstate").await?;
        let state = String::from_utf8_lossy(&output.stdout);
        Ok(!matches!(state.trim(), "shut off" | "crashed" | ""))
    }
}
