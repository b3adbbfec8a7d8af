//! Convergence rules for one entry.
//!
//! The fleet manager observes each worker handle, then asks [`decide`] what
//! to do about the gap between the stored flag and what it observed.

/// What the fleet manager saw for one domain's worker handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    /// A handle exists and the process is alive.
    Alive,
    /// A handle exists but the process has exited.
    Dead,
    /// No handle is tracked.
    Absent,
}

/// The single step that moves an entry toward its desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start a worker where none is tracked.
    Spawn,
    /// Replace an exited worker with a fresh one.
    Respawn,
    /// Signal a live worker to stop and drop its handle.
    Terminate,
    /// Drop the handle of a worker that already exited.
    Discard,
    /// Already converged with a live worker.
    Keep,
    /// Already converged with no worker.
    Idle,
}

/// Pick the action for one entry.
///
/// `desired` is the stored active flag, forced to `false` during shutdown
/// and for handles whose entry has left the store.
#[must_use]
pub const fn decide(desired: bool, observed: Observed) -> Action {
    match (desired, observed) {
        (true, Observed::Absent) => Action::Spawn,
        (true, Observed::Dead) => Action::Respawn,
        (true, Observed::Alive) => Action::Keep,
        (false, Observed::Alive) => Action::Terminate,
        (false, Observed::Dead) => Action::Discard,
        (false, Observed::Absent) => Action::Idle,
    }
}
