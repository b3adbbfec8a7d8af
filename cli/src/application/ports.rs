//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `vbmc_common`, never from
//! `crate::infra`, `crate::server`, `crate::commands`, or `crate::output`.

use std::process::Output;

use anyhow::Result;
use vbmc_common::{BmcEntry, FleetError, HypervisorAuth};

// ── Config Store Port ─────────────────────────────────────────────────────────

/// Durable desired-state records, one per domain.
///
/// Sync trait: the store is local files and every call completes before the
/// control loop moves on.
pub trait EntryStore {
    /// Load one record.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record exists, `Persistence` when it cannot be read.
    fn get(&self, domain_name: &str) -> Result<BmcEntry, FleetError>;

    /// Reserve the slot for a new domain and write its record.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the slot is taken. `Persistence` when the write
    /// fails after the slot was reserved; the caller rolls back with
    /// [`EntryStore::delete`].
    fn create(&self, entry: &BmcEntry) -> Result<(), FleetError>;

    /// Atomically replace an existing record.
    ///
    /// # Errors
    ///
    /// `Persistence` on any write failure. The old record is left intact.
    fn put(&self, entry: &BmcEntry) -> Result<(), FleetError>;

    /// Remove a record and everything stored alongside it.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record exists.
    fn delete(&self, domain_name: &str) -> Result<(), FleetError>;

    /// Every readable record, in no particular order.
    ///
    /// # Errors
    ///
    /// `Persistence` when the store itself cannot be enumerated.
    fn list(&self) -> Result<Vec<BmcEntry>, FleetError>;

    /// Whether a slot exists for `domain_name`, readable or not.
    fn contains(&self, domain_name: &str) -> bool;
}

// ── Worker Supervisor Port ────────────────────────────────────────────────────

/// Spawns, observes, and stops one isolated worker process per entry.
#[allow(async_fn_in_trait)]
pub trait WorkerSupervisor {
    /// Process identity plus whatever is needed to observe it.
    type Handle;

    /// Start a worker serving `entry`.
    async fn spawn(&self, entry: &BmcEntry) -> Result<Self::Handle>;

    /// Non-blocking liveness check.
    fn is_alive(&self, handle: &mut Self::Handle) -> bool;

    /// Stop the worker and reap it.
    async fn terminate(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Exit code once the worker has exited, `None` while it runs.
    fn exit_status(&self, handle: &mut Self::Handle) -> Option<i32>;

    /// OS process id, for logging.
    fn pid(&self, handle: &Self::Handle) -> Option<u32>;
}

// ── Hypervisor Port ───────────────────────────────────────────────────────────

/// An established (or at least verified) hypervisor connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypervisorConnection {
    pub uri: String,
    pub auth: Option<HypervisorAuth>,
    pub readonly: bool,
}

/// A domain that was found on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRef {
    pub connection: HypervisorConnection,
    pub name: String,
}

/// Virtualization host operations.
#[allow(async_fn_in_trait)]
pub trait HypervisorAdapter {
    /// Open a connection to `uri`.
    ///
    /// # Errors
    ///
    /// `FleetError::Connection` when the hypervisor is unreachable.
    async fn connect(
        &self,
        uri: &str,
        auth: Option<&HypervisorAuth>,
        readonly: bool,
    ) -> Result<HypervisorConnection, FleetError>;

    /// Find a domain by name.
    ///
    /// # Errors
    ///
    /// `FleetError::NotFound` when the hypervisor has no such domain.
    async fn lookup(
        &self,
        connection: &HypervisorConnection,
        domain_name: &str,
    ) -> Result<DomainRef, FleetError>;

    /// Whether the domain is running (paused counts as running).
    async fn is_active(&self, domain: &DomainRef) -> Result<bool>;
}

/// Verify that `uri` is reachable and hosts `domain_name`.
///
/// Opens a read-only connection and looks the domain up. Nothing is changed
/// on the hypervisor.
///
/// # Errors
///
/// `Connection` or `NotFound`, from the adapter.
pub async fn check_connection_and_domain<H: HypervisorAdapter>(
    hypervisor: &H,
    uri: &str,
    domain_name: &str,
    auth: Option<&HypervisorAuth>,
) -> Result<(), FleetError> {
    let connection = hypervisor.connect(uri, auth, true).await?;
    hypervisor.lookup(&connection, domain_name).await?;
    Ok(())
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with extra environment variables and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// runner's timeout. On timeout the child is killed, not orphaned.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<Output>;

    /// Run a program and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_env(program, args, &[]).await
    }
}
