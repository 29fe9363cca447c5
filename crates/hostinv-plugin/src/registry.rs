//! Plugin contract and registry

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::PluginError;
use crate::item::InventoryItem;
use crate::plugins;

/// Lazy item sequence produced by one plugin invocation
///
/// The sequence is single-pass; an `Err` item aborts the invocation.
pub type InventoryResult = Box<dyn Iterator<Item = Result<InventoryItem, PluginError>> + Send>;

/// Section payloads and parameters handed to one plugin invocation
#[derive(Debug, Clone, Default)]
pub struct PluginInput {
    /// Parsed sections keyed by section name; only sections the plugin
    /// declared and the source actually delivered are present
    pub sections: BTreeMap<String, Value>,
    /// Host-specific parameters resolved from the plugin's ruleset
    pub params: Option<Value>,
}

/// An inventory plugin: opaque producer of attribute sets and table rows
pub trait InventoryPlugin: Send + Sync {
    /// Unique plugin name
    fn name(&self) -> &'static str;

    /// Section names this plugin consumes
    fn sections(&self) -> &'static [&'static str];

    /// Ruleset supplying host-specific parameters, if any
    fn ruleset_name(&self) -> Option<&'static str> {
        None
    }

    /// Produce the item sequence for one invocation
    fn run(&self, input: PluginInput) -> InventoryResult;
}

/// Registry of inventory plugins
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn InventoryPlugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding all built-in plugins
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(plugins::os::OsPlugin));
        registry.register(Arc::new(plugins::cpu::CpuPlugin));
        registry.register(Arc::new(plugins::memory::MemoryPlugin));
        registry.register(Arc::new(plugins::packages::PackagesPlugin));
        registry.register(Arc::new(plugins::interfaces::InterfacesPlugin));
        registry
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn InventoryPlugin>) {
        self.plugins.push(plugin);
    }

    /// All registered plugins in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn InventoryPlugin>> {
        self.plugins.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
