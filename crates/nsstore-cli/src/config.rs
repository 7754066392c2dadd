use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use nsstore::StoreConfig;
use nsstore_engine::Quota;

/// Origin file used when neither the command line nor the config names one.
pub const DEFAULT_STORAGE_FILE: &str = "nsstore.json";

/// Settings read from the `--config` TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Origin file holding all storage entries.
    pub storage: Option<PathBuf>,
    /// Capacity of the origin in UTF-16 code units. Unlimited when unset.
    pub quota_units: Option<usize>,
    /// Store settings applied to every command.
    #[serde(flatten)]
    pub store: StoreConfig,
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, storage: Option<PathBuf>, quota: Option<usize>) -> Self {
        if storage.is_some() {
            self.storage = storage;
        }
        if quota.is_some() {
            self.quota_units = quota;
        }
        self
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FILE))
    }

    pub fn quota(&self) -> Quota {
        self.quota_units.map(Quota::units).unwrap_or_else(Quota::unlimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nsstore.toml");
        std::fs::write(
            &path,
            "storage = \"/var/lib/origin.json\"\nquota_units = 1024\ncache_reads = true\n",
        )
        .unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.storage_path(), PathBuf::from("/var/lib/origin.json"));
        assert_eq!(config.quota(), Quota::units(1024));
        assert!(config.store.cache_reads);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage_path(), PathBuf::from(DEFAULT_STORAGE_FILE));
        assert_eq!(config.quota(), Quota::unlimited());
        assert!(!config.store.cache_reads);
    }

    #[test]
    fn command_line_overrides_file() {
        let config = CliConfig {
            storage: Some("from-file.json".into()),
            quota_units: Some(10),
            store: StoreConfig::default(),
        }
        .with_overrides(Some("from-flag.json".into()), None);
        assert_eq!(config.storage_path(), PathBuf::from("from-flag.json"));
        assert_eq!(config.quota(), Quota::units(10));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(&dir.path().join("absent.toml")).is_err());
    }
}
