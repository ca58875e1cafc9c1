//! CLI configuration.
//!
//! Loaded from a TOML file (default `vocalis.toml`, overridable via
//! `--config`).  A missing file falls back to defaults; a malformed file is
//! an error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Default directory for the workflow database.
const DEFAULT_DATA_DIR: &str = "data";

/// Default shell command timeout in seconds.
const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 30;

/// Gateway CLI configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Directory holding the workflow database.
    pub data_dir: PathBuf,
    /// Timeout applied to shell passthrough commands.
    pub shell_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            shell_timeout_secs: DEFAULT_SHELL_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `path`, or defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// The configured database file path.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("vocalis.db")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = GatewayConfig::load("/definitely/not/here.toml").unwrap();
        assert_eq!(config.shell_timeout_secs, DEFAULT_SHELL_TIMEOUT_SECS);
        assert_eq!(config.db_path(), PathBuf::from("data/vocalis.db"));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocalis.toml");
        std::fs::write(&path, "data_dir = \"/var/lib/vocalis\"\nshell_timeout_secs = 5\n")
            .unwrap();

        let config = GatewayConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/vocalis"));
        assert_eq!(config.shell_timeout_secs, 5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocalis.toml");
        std::fs::write(&path, "shel_timeout_secs = 5\n").unwrap();
        assert!(GatewayConfig::load(&path).is_err());
    }
}
