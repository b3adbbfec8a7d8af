//! Fleet manager: the single writer of the entry store and owner of every
//! worker handle.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//!
//! Every public operation returns a typed [`FleetError`]; the control server
//! turns those into result codes. Convergence never fails as a whole: each
//! entry is reconciled independently and problems are logged and left for
//! the next pass.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use vbmc_common::{AddRequest, BmcEntry, BmcStatus, FleetError};

use crate::application::ports::{
    EntryStore, HypervisorAdapter, WorkerSupervisor, check_connection_and_domain,
};
use crate::domain::{Action, BmcView, Observed, decide};

/// Reconciles persisted desired state with running workers.
pub struct FleetManager<S, W: WorkerSupervisor, H> {
    store: S,
    supervisor: W,
    hypervisor: H,
    workers: HashMap<String, W::Handle>,
    /// Dead handles already reported at warn level.
    reported_dead: HashSet<String>,
    show_passwords: bool,
    probe_timeout: Duration,
}

/// Probe budget when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(4);

impl<S, W, H> FleetManager<S, W, H>
where
    S: EntryStore,
    W: WorkerSupervisor,
    H: HypervisorAdapter,
{
    pub fn new(store: S, supervisor: W, hypervisor: H, show_passwords: bool) -> Self {
        Self {
            store,
            supervisor,
            hypervisor,
            workers: HashMap::new(),
            reported_dead: HashSet::new(),
            show_passwords,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Bound the hypervisor probe `add` makes. The control loop is blocked
    /// while it runs.
    #[must_use]
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    /// Register a new, disabled entry.
    ///
    /// The request is validated and the hypervisor probed before anything
    /// touches the store.
    ///
    /// # Errors
    ///
    /// `Validation`, `Connection`, `NotFound` (domain unknown to the
    /// hypervisor), `AlreadyExists`, or `Persistence`.
    pub async fn add(&mut self, request: AddRequest) -> Result<(), FleetError> {
        let entry = request.into_entry()?;
        let probe = check_connection_and_domain(
            &self.hypervisor,
            &entry.hypervisor_uri,
            &entry.domain_name,
            entry.auth.as_ref(),
        );
        match tokio::time::timeout(self.probe_timeout, probe).await {
            Ok(result) => result?,
            Err(_elapsed) => {
                return Err(FleetError::Connection {
                    uri: entry.hypervisor_uri.clone(),
                    reason: format!(
                        "no answer within {} ms",
                        self.probe_timeout.as_millis()
                    ),
                });
            }
        }

        match self.store.create(&entry) {
            Ok(()) => {
                tracing::info!(domain = %entry.domain_name, port = entry.port, "added vBMC entry");
                Ok(())
            }
            Err(err @ FleetError::AlreadyExists(_)) => Err(err),
            Err(err) => {
                tracing::error!(domain = %entry.domain_name, "{err}");
                if let Err(rollback) = self.delete(&entry.domain_name).await {
                    tracing::debug!(domain = %entry.domain_name, error = %rollback, "rollback after failed add");
                }
                Err(err)
            }
        }
    }

    /// Stop a domain's worker and remove its record.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no record, `Persistence` when removal fails.
    pub async fn delete(&mut self, domain_name: &str) -> Result<(), FleetError> {
        if !self.store.contains(domain_name) {
            return Err(FleetError::NotFound(domain_name.to_string()));
        }
        if let Err(err) = self.stop(domain_name).await {
            tracing::debug!(domain = %domain_name, error = %err, "ignoring stop failure during delete");
        }
        self.store.delete(domain_name)?;

        self.reported_dead.remove(domain_name);
        if let Some(mut handle) = self.workers.remove(domain_name) {
            if self.supervisor.is_alive(&mut handle) {
                if let Err(err) = self.supervisor.terminate(&mut handle).await {
                    tracing::warn!(domain = %domain_name, error = %err, "failed to terminate worker of deleted entry");
                }
            }
        }
        tracing::info!(domain = %domain_name, "deleted vBMC entry");
        Ok(())
    }

    /// Enable an entry and converge.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no record, `Persistence` when the flag
    /// cannot be written. A worker that fails to spawn is not an error here.
    pub async fn start(&mut self, domain_name: &str) -> Result<(), FleetError> {
        let mut entry = self.store.get(domain_name)?;

        if entry.active && self.status_of(domain_name) == BmcStatus::Running {
            tracing::warn!(domain = %domain_name, "vBMC instance already running, ignoring start");
            return Ok(());
        }
        if !entry.active {
            entry.active = true;
            self.store.put(&entry)?;
        }
        self.periodic(false).await;
        Ok(())
    }

    /// Disable an entry and converge.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no record, `Persistence` when the flag
    /// cannot be written.
    pub async fn stop(&mut self, domain_name: &str) -> Result<(), FleetError> {
        let mut entry = self.store.get(domain_name)?;
        if entry.active {
            entry.active = false;
            self.store.put(&entry)?;
        }
        self.periodic(false).await;
        Ok(())
    }

    /// Every entry with its status, sorted by domain name.
    ///
    /// # Errors
    ///
    /// `Persistence` when the store cannot be enumerated.
    pub fn list(&mut self) -> Result<Vec<BmcView>, FleetError> {
        let mut entries = self.store.list()?;
        entries.sort_by(|a, b| a.domain_name.cmp(&b.domain_name));
        Ok(entries
            .into_iter()
            .map(|entry| {
                let status = self.status_of(&entry.domain_name);
                BmcView::new(self.redact(entry), status)
            })
            .collect())
    }

    /// One entry with its status.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no record.
    pub fn show(&mut self, domain_name: &str) -> Result<BmcView, FleetError> {
        let entry = self.store.get(domain_name)?;
        let status = self.status_of(domain_name);
        Ok(BmcView::new(self.redact(entry), status))
    }

    // ── Convergence ──────────────────────────────────────────────────────────

    /// Run one convergence pass over every entry.
    ///
    /// With `shutdown` set every entry is treated as disabled, without
    /// touching the stored flags, and handles are drained even when the
    /// store cannot be read.
    pub async fn periodic(&mut self, shutdown: bool) {
        let entries = match self.store.list() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(error = %err, "cannot enumerate entries");
                if !shutdown {
                    return;
                }
                Vec::new()
            }
        };

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            seen.insert(entry.domain_name.clone());
            let desired = !shutdown && entry.active;
            self.converge(&entry.domain_name, desired, Some(entry)).await;
        }

        // Handles whose record has disappeared from the store.
        let orphans: Vec<String> = self
            .workers
            .keys()
            .filter(|name| !seen.contains(*name))
            .cloned()
            .collect();
        for name in orphans {
            self.converge(&name, false, None).await;
        }
    }

    async fn converge(&mut self, domain_name: &str, desired: bool, entry: Option<&BmcEntry>) {
        match decide(desired, self.observe(domain_name)) {
            Action::Spawn | Action::Respawn => {
                let Some(entry) = entry else { return };
                if let Some(handle) = self.workers.get_mut(domain_name) {
                    let rc = self.supervisor.exit_status(handle);
                    if self.reported_dead.insert(domain_name.to_string()) {
                        tracing::warn!(domain = %domain_name, rc = ?rc, "found dead vBMC instance");
                    } else {
                        tracing::debug!(domain = %domain_name, rc = ?rc, "vBMC instance still dead");
                    }
                }
                match self.supervisor.spawn(entry).await {
                    Ok(handle) => {
                        let pid = self.supervisor.pid(&handle);
                        tracing::info!(domain = %domain_name, pid = ?pid, "started vBMC instance");
                        self.workers.insert(domain_name.to_string(), handle);
                        self.reported_dead.remove(domain_name);
                    }
                    Err(err) => {
                        let err = FleetError::Spawn {
                            domain: domain_name.to_string(),
                            reason: format!("{err:#}"),
                        };
                        tracing::error!(domain = %domain_name, "{err}");
                    }
                }
            }
            Action::Terminate => {
                let Some(handle) = self.workers.get_mut(domain_name) else {
                    return;
                };
                match self.supervisor.terminate(handle).await {
                    Ok(()) => {
                        self.workers.remove(domain_name);
                        tracing::info!(domain = %domain_name, "terminated vBMC instance");
                    }
                    Err(err) => {
                        tracing::warn!(domain = %domain_name, error = %format!("{err:#}"), "failed to terminate vBMC instance");
                    }
                }
            }
            Action::Discard => {
                self.reported_dead.remove(domain_name);
                if let Some(mut handle) = self.workers.remove(domain_name) {
                    let rc = self.supervisor.exit_status(&mut handle);
                    tracing::debug!(domain = %domain_name, rc = ?rc, "dropped handle of exited vBMC instance");
                }
            }
            Action::Keep | Action::Idle => {}
        }
    }

    fn observe(&mut self, domain_name: &str) -> Observed {
        let Some(handle) = self.workers.get_mut(domain_name) else {
            return Observed::Absent;
        };
        if self.supervisor.is_alive(handle) {
            Observed::Alive
        } else {
            Observed::Dead
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Status derived from the worker handle.
    pub fn status_of(&mut self, domain_name: &str) -> BmcStatus {
        match self.observe(domain_name) {
            Observed::Alive => BmcStatus::Running,
            Observed::Dead => BmcStatus::Error,
            Observed::Absent => BmcStatus::Down,
        }
    }

    /// Names of domains that currently have a handle, sorted.
    #[must_use]
    pub fn tracked_workers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn redact(&self, entry: BmcEntry) -> BmcEntry {
        if self.show_passwords {
            entry
        } else {
            entry.masked()
        }
    }
}
