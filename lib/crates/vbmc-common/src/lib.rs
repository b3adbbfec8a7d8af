//! Types shared between the `vbmcd` fleet manager and the `vbmc` control client.
//!
//! Nothing in here performs I/O: the persisted record shape, the control
//! channel schema and the error taxonomy are plain data.

pub mod entry;
pub mod error;
pub mod protocol;

pub use entry::{
    BmcEntry, BmcStatus, EntryRecord, HypervisorAuth, SECRET_MASK, parse_bool, validate_domain_name,
};
pub use error::{FleetError, RC_FAILED, RC_OK};
pub use protocol::{AddRequest, ControlRequest, ControlResponse, KNOWN_COMMANDS};
