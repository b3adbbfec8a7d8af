//! Locating and reading the YAML configuration file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::config::VbmcConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "VIRTUALBMC_CONFIG";

const USER_CONFIG: &str = ".vbmc/virtualbmc.yaml";
const SYSTEM_CONFIG: &str = "/etc/virtualbmc/virtualbmc.yaml";

/// Loads `VbmcConfig` from the first configuration file that applies.
pub struct YamlConfigLoader {
    explicit: Option<PathBuf>,
}

impl YamlConfigLoader {
    /// `explicit` (from `--config`) wins over every other source.
    #[must_use]
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }

    /// Read, expand, and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is unknown, an explicitly named
    /// file is missing, or the file cannot be read, parsed, or validated.
    pub fn load(&self) -> Result<VbmcConfig> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        let path = resolve_path(
            self.explicit.as_deref(),
            std::env::var_os(CONFIG_ENV),
            &home,
        );
        load_from(path.as_deref(), self.explicit.is_some(), &home)
    }
}

/// Pick the configuration file: explicit path, then `$VIRTUALBMC_CONFIG`,
/// then the per-user file, then the system file.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>, env: Option<OsString>, home: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    [home.join(USER_CONFIG), PathBuf::from(SYSTEM_CONFIG)]
        .into_iter()
        .find(|p| p.is_file())
}

/// Load from `path`, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if `required` and the file is missing, or if it cannot
/// be read, parsed, or validated.
pub fn load_from(path: Option<&Path>, required: bool, home: &Path) -> Result<VbmcConfig> {
    let config = match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            if content.trim().is_empty() {
                VbmcConfig::default()
            } else {
                serde_yaml::from_str(&content)
                    .with_context(|| format!("cannot parse {}", path.display()))?
            }
        }
        Some(path) if required => anyhow::bail!("config file {} not found", path.display()),
        _ => VbmcConfig::default(),
    };
    let config = config.expand_home(home);
    config.validate()?;
    Ok(config)
}
