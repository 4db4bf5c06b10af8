//! TOML configuration for a running instance.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tangelo_types::error::Result;
use tangelo_vfs::DEFAULT_MAX_SIZE;

/// Instance configuration. Every field has a default, so a missing or
/// partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted JSON documents.
    pub data_dir: PathBuf,
    /// Command store file name, relative to `data_dir`.
    pub command_store_file: String,
    /// Filesystem snapshot file name, relative to `data_dir`.
    pub filesystem_store_file: String,
    /// Per-identity filesystem byte quota.
    pub fs_quota_bytes: u64,
    /// How long one bank placeholder fetch may block, in seconds.
    pub bank_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            command_store_file: "commands.json".to_string(),
            filesystem_store_file: "filesystems.json".to_string(),
            fs_quota_bytes: DEFAULT_MAX_SIZE,
            bank_timeout_secs: 2,
        }
    }
}

impl Config {
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Self::from_str(&std::fs::read_to_string(path)?)
    }

    pub fn command_store_path(&self) -> PathBuf {
        self.data_dir.join(&self.command_store_file)
    }

    pub fn filesystem_store_path(&self) -> PathBuf {
        self.data_dir.join(&self.filesystem_store_file)
    }

    pub fn bank_timeout(&self) -> Duration {
        Duration::from_secs(self.bank_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.command_store_path(), PathBuf::from("data/commands.json"));
        assert_eq!(
            config.filesystem_store_path(),
            PathBuf::from("data/filesystems.json")
        );
        assert_eq!(config.fs_quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.bank_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = Config::from_str("bank_timeout_secs = 5\n").unwrap();
        assert_eq!(config.bank_timeout_secs, 5);
        assert_eq!(config.command_store_file, "commands.json");
    }

    #[test]
    fn full_file_parses() {
        let config = Config::from_str(
            r#"
data_dir = "/var/lib/tangelo"
command_store_file = "cmds.json"
filesystem_store_file = "fs.json"
fs_quota_bytes = 1048576
bank_timeout_secs = 1
"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tangelo"));
        assert_eq!(config.fs_quota_bytes, 1_048_576);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::from_str("data_dir = [[[").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/tangelo.toml")).unwrap();
        assert_eq!(config.bank_timeout_secs, 2);
    }
}
