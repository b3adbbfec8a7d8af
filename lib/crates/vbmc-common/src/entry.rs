//! The per-domain BMC record and its persisted key/value form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FleetError;

/// Replacement text for secrets in anything shown to a user.
pub const SECRET_MASK: &str = "***";

const MAX_DOMAIN_NAME_LEN: usize = 255;

/// Credentials for an authenticated hypervisor connection.
///
/// Only ever present as a pair: a username without a password (or the
/// reverse) is rejected wherever an entry is built.
#[derive(Clone, PartialEq, Eq)]
pub struct HypervisorAuth {
    pub username: String,
    pub password: String,
}

impl HypervisorAuth {
    /// Build the pair from two optional halves.
    ///
    /// # Errors
    ///
    /// Returns `FleetError::Validation` when exactly one half is given.
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Self>, FleetError> {
        let username = username.filter(|u| !u.is_empty());
        let password = password.filter(|p| !p.is_empty());
        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Self { username, password })),
            (None, None) => Ok(None),
            _ => Err(FleetError::Validation(
                "A password and username are required to use the hypervisor's SASL authentication"
                    .to_string(),
            )),
        }
    }
}

impl fmt::Debug for HypervisorAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HypervisorAuth")
            .field("username", &self.username)
            .field("password", &SECRET_MASK)
            .finish()
    }
}

/// Desired-state record for one BMC endpoint, keyed by `domain_name`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntryRecord", into = "EntryRecord")]
pub struct BmcEntry {
    pub domain_name: String,
    pub username: String,
    pub password: String,
    pub address: String,
    pub port: u16,
    pub hypervisor_uri: String,
    pub auth: Option<HypervisorAuth>,
    pub active: bool,
}

impl BmcEntry {
    /// Copy of the entry with every password replaced by [`SECRET_MASK`].
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut out = self.clone();
        out.password = SECRET_MASK.to_string();
        if let Some(auth) = out.auth.as_mut() {
            auth.password = SECRET_MASK.to_string();
        }
        out
    }

    /// Property/value pairs sorted by property name.
    ///
    /// Auth properties are listed only when the entry carries credentials.
    #[must_use]
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let mut props = vec![
            ("active", self.active.to_string()),
            ("address", self.address.clone()),
            ("domain_name", self.domain_name.clone()),
            ("hypervisor_uri", self.hypervisor_uri.clone()),
            ("password", self.password.clone()),
            ("port", self.port.to_string()),
            ("username", self.username.clone()),
        ];
        if let Some(auth) = &self.auth {
            props.push(("auth_username", auth.username.clone()));
            props.push(("auth_password", auth.password.clone()));
        }
        props.sort_by(|a, b| a.0.cmp(b.0));
        props
    }
}

impl fmt::Debug for BmcEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BmcEntry")
            .field("domain_name", &self.domain_name)
            .field("username", &self.username)
            .field("password", &SECRET_MASK)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("hypervisor_uri", &self.hypervisor_uri)
            .field("auth", &self.auth)
            .field("active", &self.active)
            .finish()
    }
}

/// Flat key/value shape an entry is stored and transported in.
///
/// `active` is kept as the canonical string `"true"` or `"false"`; YAML
/// booleans written by hand are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    pub domain_name: String,
    pub username: String,
    pub password: String,
    pub address: String,
    pub port: u16,
    pub hypervisor_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    #[serde(default = "default_active", deserialize_with = "string_or_bool")]
    pub active: String,
}

fn default_active() -> String {
    "false".to_string()
}

fn string_or_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b.to_string(),
        Raw::Text(s) => s,
    })
}

/// Interpret a canonical boolean string (`true`/`false`, any case).
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl TryFrom<EntryRecord> for BmcEntry {
    type Error = FleetError;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        validate_domain_name(&record.domain_name)?;
        let auth = HypervisorAuth::from_parts(record.auth_username, record.auth_password)?;
        Ok(Self {
            domain_name: record.domain_name,
            username: record.username,
            password: record.password,
            address: record.address,
            port: record.port,
            hypervisor_uri: record.hypervisor_uri,
            auth,
            // An unreadable flag counts as disabled.
            active: parse_bool(&record.active).unwrap_or(false),
        })
    }
}

impl From<BmcEntry> for EntryRecord {
    fn from(entry: BmcEntry) -> Self {
        let (auth_username, auth_password) = match entry.auth {
            Some(auth) => (Some(auth.username), Some(auth.password)),
            None => (None, None),
        };
        Self {
            domain_name: entry.domain_name,
            username: entry.username,
            password: entry.password,
            address: entry.address,
            port: entry.port,
            hypervisor_uri: entry.hypervisor_uri,
            auth_username,
            auth_password,
            active: entry.active.to_string(),
        }
    }
}

/// Check that a domain name is usable as a single path component.
///
/// # Errors
///
/// Returns `FleetError::Validation` for empty names, `.`/`..`, names with a
/// path separator or NUL byte, and names longer than 255 bytes.
pub fn validate_domain_name(name: &str) -> Result<(), FleetError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.len() > MAX_DOMAIN_NAME_LEN
        || name.contains(['/', '\0']);
    if invalid {
        return Err(FleetError::Validation(format!("Invalid domain name '{name}'")));
    }
    Ok(())
}

/// Runtime status of an entry, derived from its worker handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmcStatus {
    /// A worker exists and is alive.
    Running,
    /// A worker exists but exited on its own.
    Error,
    /// No worker.
    Down,
}

impl BmcStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Error => "error",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for BmcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
