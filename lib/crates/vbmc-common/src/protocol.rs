//! Control channel schema.
//!
//! A request is one JSON object whose `command` field selects the variant;
//! a response always carries `rc` and `msg`, and `list`/`show` add a table
//! as `header` + `rows`.

use serde::{Deserialize, Serialize};

use crate::entry::{BmcEntry, HypervisorAuth, validate_domain_name};
use crate::error::{FleetError, RC_FAILED, RC_OK};

/// Command names the server understands.
pub const KNOWN_COMMANDS: &[&str] = &["add", "delete", "start", "stop", "list", "show"];

/// One administrative command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ControlRequest {
    Add(AddRequest),
    Delete { domain_names: Vec<String> },
    Start { domain_names: Vec<String> },
    Stop { domain_names: Vec<String> },
    List,
    Show { domain_name: String },
}

impl ControlRequest {
    /// Wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Delete { .. } => "delete",
            Self::Start { .. } => "start",
            Self::Stop { .. } => "stop",
            Self::List => "list",
            Self::Show { .. } => "show",
        }
    }
}

/// Fields of the `add` command.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRequest {
    pub domain_name: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub address: String,
    pub hypervisor_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
}

impl AddRequest {
    /// Validate the request and turn it into a disabled entry.
    ///
    /// # Errors
    ///
    /// Returns `FleetError::Validation` for a bad domain name or half an
    /// auth pair.
    pub fn into_entry(self) -> Result<BmcEntry, FleetError> {
        validate_domain_name(&self.domain_name)?;
        let auth = HypervisorAuth::from_parts(self.auth_username, self.auth_password)?;
        Ok(BmcEntry {
            domain_name: self.domain_name,
            username: self.username,
            password: self.password,
            address: self.address,
            port: self.port,
            hypervisor_uri: self.hypervisor_uri,
            auth,
            active: false,
        })
    }
}

impl std::fmt::Debug for AddRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddRequest")
            .field("domain_name", &self.domain_name)
            .field("username", &self.username)
            .field("port", &self.port)
            .field("address", &self.address)
            .field("hypervisor_uri", &self.hypervisor_uri)
            .field("auth_username", &self.auth_username)
            .finish_non_exhaustive()
    }
}

/// Reply to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub rc: i32,
    #[serde(default)]
    pub msg: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<String>>>,
}

impl ControlResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            rc: RC_OK,
            msg: Vec::new(),
            header: None,
            rows: None,
        }
    }

    #[must_use]
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            rc: RC_FAILED,
            msg: vec![msg.into()],
            header: None,
            rows: None,
        }
    }

    #[must_use]
    pub fn table(header: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            rc: RC_OK,
            msg: Vec::new(),
            header: Some(header.iter().map(ToString::to_string).collect()),
            rows: Some(rows),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.rc == RC_OK
    }
}

impl From<Result<(), FleetError>> for ControlResponse {
    fn from(result: Result<(), FleetError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self {
                rc: e.rc(),
                msg: vec![e.to_string()],
                header: None,
                rows: None,
            },
        }
    }
}
