//! Unit tests for the vbmc fleet manager
//!
//! These tests use fake collaborators and temporary directories. Only the
//! supervisor tests start real (trivial) child processes.

mod entry_store;
mod helpers;
mod hypervisor;
mod property_tests;
mod supervisor;
