//! Virtual BMC fleet manager: the `vbmcd` daemon, its workers, and the
//! `vbmc` control client. Exposed as a library for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod application;
pub mod cli;
pub mod commands;
pub mod daemon;
pub mod domain;
pub mod infra;
pub mod output;
pub mod server;
pub mod worker;
