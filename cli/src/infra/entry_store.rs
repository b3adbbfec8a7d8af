//! Infrastructure implementation of the `EntryStore` port.
//!
//! `FileEntryStore` keeps one directory per domain under the config dir,
//! each holding a YAML `config` record. Records are replaced atomically
//! (temp file + rename) so a crash mid-write never leaves a partial record.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vbmc_common::{BmcEntry, FleetError, validate_domain_name};

use crate::application::ports::EntryStore;

const RECORD_FILE: &str = "config";
const TEMP_FILE: &str = "config.tmp";

/// File-backed entry store.
pub struct FileEntryStore {
    root: PathBuf,
}

impl FileEntryStore {
    /// Store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn domain_dir(&self, domain_name: &str) -> Result<PathBuf, FleetError> {
        validate_domain_name(domain_name)?;
        Ok(self.root.join(domain_name))
    }

    fn read_record(path: &Path) -> Result<BmcEntry> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading record {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("parsing record {}", path.display()))
    }

    fn write_record(dir: &Path, entry: &BmcEntry) -> Result<()> {
        let content = serde_yaml::to_string(entry).context("serializing record")?;
        let temp_path = dir.join(TEMP_FILE);

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&temp_path)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.sync_all())
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        let path = dir.join(RECORD_FILE);
        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("finalizing record {}", path.display()))
    }
}

impl EntryStore for FileEntryStore {
    fn get(&self, domain_name: &str) -> Result<BmcEntry, FleetError> {
        let path = self.domain_dir(domain_name)?.join(RECORD_FILE);
        if !path.is_file() {
            return Err(FleetError::NotFound(domain_name.to_string()));
        }
        let entry = Self::read_record(&path)
            .map_err(|e| FleetError::persistence(domain_name, format!("{e:#}")))?;
        if entry.domain_name != domain_name {
            return Err(FleetError::persistence(
                domain_name,
                format!("record names domain {}", entry.domain_name),
            ));
        }
        Ok(entry)
    }

    fn create(&self, entry: &BmcEntry) -> Result<(), FleetError> {
        let dir = self.domain_dir(&entry.domain_name)?;
        std::fs::create_dir_all(&self.root)
            .map_err(|e| FleetError::persistence(&entry.domain_name, e))?;
        match std::fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(FleetError::AlreadyExists(entry.domain_name.clone()));
            }
            Err(e) => {
                return Err(FleetError::persistence(
                    &entry.domain_name,
                    format!("creating {}: {e}", dir.display()),
                ));
            }
        }
        Self::write_record(&dir, entry)
            .map_err(|e| FleetError::persistence(&entry.domain_name, format!("{e:#}")))
    }

    fn put(&self, entry: &BmcEntry) -> Result<(), FleetError> {
        let dir = self.domain_dir(&entry.domain_name)?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating directory {}", dir.display()))
            .and_then(|()| Self::write_record(&dir, entry))
            .map_err(|e| FleetError::persistence(&entry.domain_name, format!("{e:#}")))
    }

    fn delete(&self, domain_name: &str) -> Result<(), FleetError> {
        let dir = self.domain_dir(domain_name)?;
        if !dir.is_dir() {
            return Err(FleetError::NotFound(domain_name.to_string()));
        }
        std::fs::remove_dir_all(&dir)
            .map_err(|e| FleetError::persistence(domain_name, format!("removing {}: {e}", dir.display())))
    }

    fn list(&self) -> Result<Vec<BmcEntry>, FleetError> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(FleetError::persistence(
                    "*",
                    format!("listing {}: {e}", self.root.display()),
                ));
            }
        };

        let mut entries = Vec::new();
        for dirent in read_dir.flatten() {
            if !dirent.path().is_dir() {
                continue;
            }
            let name = dirent.file_name().to_string_lossy().into_owned();
            match self.get(&name) {
                Ok(entry) => entries.push(entry),
                Err(FleetError::NotFound(_)) => {}
                Err(e) => tracing::warn!(domain = %name, error = %e, "skipping unreadable record"),
            }
        }
        Ok(entries)
    }

    fn contains(&self, domain_name: &str) -> bool {
        self.domain_dir(domain_name).is_ok_and(|dir| dir.is_dir())
    }
}
