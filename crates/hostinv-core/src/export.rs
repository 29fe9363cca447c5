//! Inventory export hooks
//!
//! Hooks push a finished inventory tree into external systems. Their
//! side effects may be partially applied on failure, so a failing hook
//! aborts the whole host run instead of being recorded and skipped.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use hostinv_tree::StructuredTree;

use crate::config::HostInventoryConfig;
use crate::error::CoreError;

/// Side-effecting export of a finished inventory tree
pub trait ExportHook: Send + Sync {
    /// Hook name referenced by host configurations
    fn name(&self) -> &'static str;

    /// Export the raw tree for one host
    fn export(&self, hostname: &str, params: &Value, raw_tree: &Value) -> Result<(), String>;
}

/// Registry of export hooks by name
#[derive(Default)]
pub struct ExportHookRegistry {
    hooks: HashMap<String, Arc<dyn ExportHook>>,
}

impl ExportHookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook under its own name
    pub fn register(&mut self, hook: Arc<dyn ExportHook>) {
        self.hooks.insert(hook.name().to_string(), hook);
    }

    /// Run every hook configured for this host
    ///
    /// # Errors
    /// A failing hook aborts the host run; an unknown hook name is a
    /// configuration error.
    pub fn run_all(
        &self,
        config: &HostInventoryConfig,
        tree: &StructuredTree,
    ) -> Result<(), CoreError> {
        if config.export_hooks.is_empty() {
            return Ok(());
        }

        let raw_tree = tree.to_value();
        for spec in &config.export_hooks {
            let hook = self
                .hooks
                .get(&spec.name)
                .ok_or_else(|| CoreError::UnknownExportHook(spec.name.clone()))?;
            debug!(hook = %spec.name, "running export hook");
            hook.export(&config.name, &spec.params, &raw_tree)
                .map_err(|message| CoreError::ExportHook {
                    hook: spec.name.clone(),
                    message,
                })?;
        }
        Ok(())
    }
}
