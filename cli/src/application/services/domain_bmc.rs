//! Hypervisor view of the one domain a worker serves.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//!
//! Each call opens a fresh read-only hypervisor connection.

use anyhow::{Context, Result};
use vbmc_common::{BmcEntry, HypervisorAuth};

use crate::application::ports::HypervisorAdapter;

/// Chassis power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off = 0,
    On = 1,
}

/// Hypervisor connection details bound to one domain.
pub struct DomainBmc<H> {
    hypervisor: H,
    domain_name: String,
    uri: String,
    auth: Option<HypervisorAuth>,
}

impl<H: HypervisorAdapter> DomainBmc<H> {
    pub fn new(hypervisor: H, entry: &BmcEntry) -> Self {
        Self {
            hypervisor,
            domain_name: entry.domain_name.clone(),
            uri: entry.hypervisor_uri.clone(),
            auth: entry.auth.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the domain cannot be reached or its state read.
    pub async fn get_power_state(&self) -> Result<PowerState> {
        tracing::debug!(domain = %self.domain_name, "get power state");
        let active = self.is_active().await.with_context(|| {
            format!(
                "Error getting the power state of domain {}",
                self.domain_name
            )
        })?;
        Ok(if active { PowerState::On } else { PowerState::Off })
    }

    async fn is_active(&self) -> Result<bool> {
        let connection = self
            .hypervisor
            .connect(&self.uri, self.auth.as_ref(), true)
            .await?;
        let domain = self.hypervisor.lookup(&connection, &self.domain_name).await?;
        self.hypervisor.is_active(&domain).await
    }
}
