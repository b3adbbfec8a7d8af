//! Control plane: the request loop and its command table.
//!
//! Builds on `crate::application` and `crate::infra`. Nothing below this
//! layer imports from it.

pub mod control;
pub mod dispatch;

pub use control::{ControlServer, ServerSettings, bind};
pub use dispatch::dispatch;
