//! Configuration loading and types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hostinv_core::{HostInventoryConfig, InventoryPaths};

/// Top-level configuration for hostinv
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage and spool settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Individual host configurations
    #[serde(default)]
    pub host: Vec<HostInventoryConfig>,
}

/// Storage and spool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for inventory, archive and status-data trees
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Directory the agent transport drops output files into
    pub spool_dir: Option<PathBuf>,
    /// Maximum allowed age of spool files in seconds
    pub max_spool_age_secs: Option<i64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            spool_dir: None,
            max_spool_age_secs: None,
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("/var/lib/hostinv")
}

impl StorageConfig {
    /// On-disk tree layout derived from the base directory
    #[must_use]
    pub fn paths(&self) -> InventoryPaths {
        InventoryPaths::under(&self.base_dir)
    }

    /// Spool directory, defaulting to `<base_dir>/spool`
    #[must_use]
    pub fn spool_dir(&self) -> PathBuf {
        self.spool_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("spool"))
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    ///
    /// # Errors
    /// Returns error if an existing config file cannot be parsed
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("HOSTINV_CONFIG") {
            return Self::load(&PathBuf::from(path));
        }

        let paths = [
            PathBuf::from("hostinv.toml"),
            PathBuf::from("/etc/hostinv/hostinv.toml"),
        ];
        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }

    /// Configuration for one host by name
    #[must_use]
    pub fn host(&self, name: &str) -> Option<&HostInventoryConfig> {
        self.host.iter().find(|h| h.name == name)
    }
}
