//! Shell Configuration
//!
//! YAML-backed startup configuration for the emulator.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::HuskError;

fn default_username() -> String {
    "user".to_string()
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("virtual_fs")
}

/// Startup configuration, read from a YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Name shown in the prompt and attached to every log entry
    #[serde(default = "default_username")]
    pub username: String,

    /// Host label shown in the prompt
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Archive holding the virtual filesystem tree (tar, optionally gzipped)
    pub virtual_fs_path: PathBuf,

    /// XML audit log location
    pub log_file_path: PathBuf,

    /// Directory the archive is staged into; wiped on every startup
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

impl ShellConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<ShellConfig, HuskError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HuskError::config(format!("cannot read '{}': {}", path.display(), e)))?;
        let config: ShellConfig = serde_yaml::from_str(&raw)
            .map_err(|e| HuskError::config(format!("cannot parse '{}': {}", path.display(), e)))?;
        if !config.virtual_fs_path.exists() {
            return Err(HuskError::config(format!(
                "virtual filesystem archive '{}' does not exist",
                config.virtual_fs_path.display()
            )));
        }
        Ok(config)
    }
}
