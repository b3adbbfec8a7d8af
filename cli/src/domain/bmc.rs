//! Table shapes for `list` and `show`.

use vbmc_common::{BmcEntry, BmcStatus};

pub const LIST_HEADER: [&str; 4] = ["Domain name", "Status", "Address", "Port"];
pub const SHOW_HEADER: [&str; 2] = ["Property", "Value"];

/// An entry together with the status derived from its worker handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmcView {
    pub entry: BmcEntry,
    pub status: BmcStatus,
}

impl BmcView {
    #[must_use]
    pub const fn new(entry: BmcEntry, status: BmcStatus) -> Self {
        Self { entry, status }
    }

    /// One `list` row.
    #[must_use]
    pub fn list_row(&self) -> Vec<String> {
        vec![
            self.entry.domain_name.clone(),
            self.status.to_string(),
            self.entry.address.clone(),
            self.entry.port.to_string(),
        ]
    }

    /// Property rows for `show`, sorted by property name, including `status`.
    #[must_use]
    pub fn show_rows(&self) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = self
            .entry
            .properties()
            .into_iter()
            .map(|(k, v)| vec![k.to_string(), v])
            .chain(std::iter::once(vec![
                "status".to_string(),
                self.status.to_string(),
            ]))
            .collect();
        rows.sort_by(|a, b| a[0].cmp(&b[0]));
        rows
    }
}
