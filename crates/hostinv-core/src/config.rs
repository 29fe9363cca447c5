//! Per-host inventory configuration

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-host flags and parameters, resolved once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInventoryConfig {
    /// Unique hostname identifier
    pub name: String,
    /// Whether this host is a cluster of other hosts
    #[serde(default)]
    pub is_cluster: bool,
    /// Member node names for clusters
    #[serde(default)]
    pub nodes: Vec<String>,
    /// Whether status-data inventory is collected for this host
    #[serde(default = "default_status_data_inventory")]
    pub status_data_inventory: bool,
    /// Export hooks to run after the inventory pass
    #[serde(default)]
    pub export_hooks: Vec<ExportHookSpec>,
    /// Host-specific plugin parameters keyed by ruleset name
    #[serde(default)]
    pub inventory_parameters: BTreeMap<String, Value>,
}

fn default_status_data_inventory() -> bool {
    true
}

impl HostInventoryConfig {
    /// Minimal configuration for a real host
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_cluster: false,
            nodes: Vec::new(),
            status_data_inventory: true,
            export_hooks: Vec::new(),
            inventory_parameters: BTreeMap::new(),
        }
    }

    /// Configuration for a cluster host with the given member nodes
    #[must_use]
    pub fn cluster(name: impl Into<String>, nodes: Vec<String>) -> Self {
        Self {
            is_cluster: true,
            nodes,
            ..Self::new(name)
        }
    }

    /// Parameters for a plugin's ruleset, if configured for this host
    #[must_use]
    pub fn inventory_parameters(&self, ruleset: &str) -> Option<&Value> {
        self.inventory_parameters.get(ruleset)
    }
}

/// Export hook reference with its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportHookSpec {
    /// Registered hook name
    pub name: String,
    /// Hook-specific parameters
    #[serde(default)]
    pub params: Value,
}

/// Options for one inventory run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Restrict the run to these sections; such a partial run is never
    /// persisted
    pub selected_sections: Option<BTreeSet<String>>,
    /// Run only these plugins
    pub run_only_plugins: Option<BTreeSet<String>>,
    /// Propagate recoverable errors instead of recording them
    pub strict: bool,
}
