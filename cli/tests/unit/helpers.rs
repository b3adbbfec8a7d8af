//! Shared fakes for the port traits and builders for common fixtures.

#![allow(dead_code, clippy::expect_used)]

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use vbmc_cli::application::ports::{
    CommandRunner, DomainRef, EntryStore, HypervisorAdapter, HypervisorConnection,
    WorkerSupervisor,
};
use vbmc_cli::application::services::fleet::FleetManager;
use vbmc_cli::infra::entry_store::FileEntryStore;
use vbmc_common::{AddRequest, BmcEntry, FleetError, HypervisorAuth};

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn add_request(name: &str) -> AddRequest {
    AddRequest {
        domain_name: name.to_string(),
        username: "admin".to_string(),
        password: "s3cret".to_string(),
        port: 6230,
        address: "127.0.0.1".to_string(),
        hypervisor_uri: "qemu:///system".to_string(),
        auth_username: None,
        auth_password: None,
    }
}

pub fn entry(name: &str, active: bool) -> BmcEntry {
    let mut entry = add_request(name).into_entry().expect("valid request");
    entry.active = active;
    entry
}

pub type TestManager = FleetManager<FlakyStore, FakeSupervisor, FakeHypervisor>;

/// Manager over a real store in `dir`, with fakes for everything else.
pub fn manager(dir: &Path) -> (TestManager, FakeSupervisor, FlakyStore) {
    let store = FlakyStore::new(dir);
    let supervisor = FakeSupervisor::default();
    let hypervisor = FakeHypervisor::with_domains(&["vm1", "vm2", "vm3"]);
    let manager = FleetManager::new(store.clone(), supervisor.clone(), hypervisor, false);
    (manager, supervisor, store)
}

// ── Entry store with injectable failures ─────────────────────────────────────

/// `FileEntryStore` whose `create` and `list` can be made to fail.
#[derive(Clone)]
pub struct FlakyStore {
    pub inner: Rc<FileEntryStore>,
    pub fail_create: Rc<Cell<bool>>,
    pub fail_list: Rc<Cell<bool>>,
}

impl FlakyStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            inner: Rc::new(FileEntryStore::new(dir)),
            fail_create: Rc::new(Cell::new(false)),
            fail_list: Rc::new(Cell::new(false)),
        }
    }
}

impl EntryStore for FlakyStore {
    fn get(&self, domain_name: &str) -> Result<BmcEntry, FleetError> {
        self.inner.get(domain_name)
    }

    fn create(&self, entry: &BmcEntry) -> Result<(), FleetError> {
        self.inner.create(entry)?;
        if self.fail_create.get() {
            return Err(FleetError::persistence(&entry.domain_name, "disk full"));
        }
        Ok(())
    }

    fn put(&self, entry: &BmcEntry) -> Result<(), FleetError> {
        self.inner.put(entry)
    }

    fn delete(&self, domain_name: &str) -> Result<(), FleetError> {
        self.inner.delete(domain_name)
    }

    fn list(&self) -> Result<Vec<BmcEntry>, FleetError> {
        if self.fail_list.get() {
            return Err(FleetError::persistence("*", "store unreadable"));
        }
        self.inner.list()
    }

    fn contains(&self, domain_name: &str) -> bool {
        self.inner.contains(domain_name)
    }
}

// ── Worker supervisor ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SupervisorState {
    next_id: u32,
    alive: HashMap<u32, bool>,
    owner: HashMap<u32, String>,
    pub spawned: Vec<String>,
    pub terminated: Vec<String>,
    pub fail_spawn: HashSet<String>,
    pub fail_terminate: bool,
}

/// In-memory supervisor. Clones share state so a test can inspect and
/// disturb workers owned by a `FleetManager`.
#[derive(Clone, Default)]
pub struct FakeSupervisor {
    pub state: Arc<Mutex<SupervisorState>>,
}

pub struct FakeHandle {
    pub id: u32,
}

impl FakeSupervisor {
    fn with<T>(&self, f: impl FnOnce(&mut SupervisorState) -> T) -> T {
        f(&mut self.state.lock().expect("supervisor state"))
    }

    pub fn spawned(&self) -> Vec<String> {
        self.with(|s| s.spawned.clone())
    }

    pub fn terminated(&self) -> Vec<String> {
        self.with(|s| s.terminated.clone())
    }

    /// Number of live workers serving `name`.
    pub fn live(&self, name: &str) -> usize {
        self.with(|s| {
            s.owner
                .iter()
                .filter(|(id, owner)| owner.as_str() == name && s.alive[*id])
                .count()
        })
    }

    pub fn live_total(&self) -> usize {
        self.with(|s| s.alive.values().filter(|a| **a).count())
    }

    /// Simulate a crash of every live worker serving `name`.
    pub fn kill_out_of_band(&self, name: &str) {
        self.with(|s| {
            let ids: Vec<u32> = s
                .owner
                .iter()
                .filter(|(_, owner)| owner.as_str() == name)
                .map(|(id, _)| *id)
                .collect();
            for id in ids {
                s.alive.insert(id, false);
            }
        });
    }

    pub fn fail_spawn(&self, name: &str, fail: bool) {
        self.with(|s| {
            if fail {
                s.fail_spawn.insert(name.to_string());
            } else {
                s.fail_spawn.remove(name);
            }
        });
    }

    pub fn fail_terminate(&self, fail: bool) {
        self.with(|s| s.fail_terminate = fail);
    }
}

impl WorkerSupervisor for FakeSupervisor {
    type Handle = FakeHandle;

    async fn spawn(&self, entry: &BmcEntry) -> Result<FakeHandle> {
        self.with(|s| {
            if s.fail_spawn.contains(&entry.domain_name) {
                anyhow::bail!("address already in use");
            }
            s.next_id += 1;
            let id = s.next_id;
            s.alive.insert(id, true);
            s.owner.insert(id, entry.domain_name.clone());
            s.spawned.push(entry.domain_name.clone());
            Ok(FakeHandle { id })
        })
    }

    fn is_alive(&self, handle: &mut FakeHandle) -> bool {
        self.with(|s| s.alive.get(&handle.id).copied().unwrap_or(false))
    }

    async fn terminate(&self, handle: &mut FakeHandle) -> Result<()> {
        self.with(|s| {
            if s.fail_terminate {
                anyhow::bail!("worker refused to die");
            }
            s.alive.insert(handle.id, false);
            let name = s.owner.get(&handle.id).cloned().unwrap_or_default();
            s.terminated.push(name);
            Ok(())
        })
    }

    fn exit_status(&self, handle: &mut FakeHandle) -> Option<i32> {
        if self.is_alive(handle) { None } else { Some(-9) }
    }

    fn pid(&self, handle: &FakeHandle) -> Option<u32> {
        Some(handle.id)
    }
}

// ── Hypervisor ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct HypervisorState {
    pub domains: HashSet<String>,
    pub active: bool,
    pub fail_ops: bool,
    pub connections: Vec<HypervisorConnection>,
    /// Stall every `connect` this long, like a hung hypervisor.
    pub connect_delay: Option<Duration>,
}

/// Knows a fixed set of domains. Any URI starting with `unreachable`
/// fails to connect.
#[derive(Clone, Default)]
pub struct FakeHypervisor {
    pub state: Arc<Mutex<HypervisorState>>,
}

impl FakeHypervisor {
    pub fn with_domains(names: &[&str]) -> Self {
        let hv = Self::default();
        hv.with(|s| s.domains = names.iter().map(ToString::to_string).collect());
        hv
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut HypervisorState) -> T) -> T {
        f(&mut self.state.lock().expect("hypervisor state"))
    }
}

impl HypervisorAdapter for FakeHypervisor {
    async fn connect(
        &self,
        uri: &str,
        auth: Option<&HypervisorAuth>,
        readonly: bool,
    ) -> Result<HypervisorConnection, FleetError> {
        if let Some(delay) = self.with(|s| s.connect_delay) {
            tokio::time::sleep(delay).await;
        }
        if uri.starts_with("unreachable") {
            return Err(FleetError::Connection {
                uri: uri.to_string(),
                reason: "no route to host".to_string(),
            });
        }
        let connection = HypervisorConnection {
            uri: uri.to_string(),
            auth: auth.cloned(),
            readonly,
        };
        self.with(|s| s.connections.push(connection.clone()));
        Ok(connection)
    }

    async fn lookup(
        &self,
        connection: &HypervisorConnection,
        domain_name: &str,
    ) -> Result<DomainRef, FleetError> {
        if !self.with(|s| s.domains.contains(domain_name)) {
            return Err(FleetError::NotFound(domain_name.to_string()));
        }
        Ok(DomainRef {
            connection: connection.clone(),
            name: domain_name.to_string(),
        })
    }

    async fn is_active(&self, _domain: &DomainRef) -> Result<bool> {
        self.with(|s| {
            if s.fail_ops {
                anyhow::bail!("cannot read domain state");
            }
            Ok(s.active)
        })
    }
}

// ── Command runner ───────────────────────────────────────────────────────────

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

/// Records every invocation and answers from a queue of canned outputs.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    pub calls: Arc<Mutex<Vec<(String, Vec<String>, Vec<(String, String)>)>>>,
    pub replies: Arc<Mutex<Vec<Output>>>,
}

impl RecordingRunner {
    pub fn replying(replies: Vec<Output>) -> Self {
        let runner = Self::default();
        *runner.replies.lock().expect("replies") = replies.into_iter().rev().collect();
        runner
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>, Vec<(String, String)>)> {
        self.calls.lock().expect("calls").clone()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<Output> {
        self.calls.lock().expect("calls").push((
            program.to_string(),
            args.iter().map(ToString::to_string).collect(),
            env.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ));
        self.replies
            .lock()
            .expect("replies")
            .pop()
            .ok_or_else(|| anyhow::anyhow!("no canned reply left for {program}"))
    }
}
