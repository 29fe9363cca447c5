//! Memory inventory plugin

use serde::Deserialize;

use crate::error::PluginError;
use crate::item::{Attributes, InventoryItem};
use crate::plugins::{run_collected, section_rows};
use crate::registry::{InventoryPlugin, InventoryResult, PluginInput};

#[derive(Deserialize)]
struct MemoryRow {
    total: u64,
    free: u64,
    used: u64,
    swap_total: u64,
    swap_free: u64,
}

/// Collects memory facts into `hardware.memory`
///
/// Sizes are durable inventory; the free/used split is status data.
pub struct MemoryPlugin;

impl MemoryPlugin {
    fn items(&self, input: &PluginInput) -> Result<Vec<InventoryItem>, PluginError> {
        let Some(mem) = section_rows::<MemoryRow>(input, "memory_info")?
            .into_iter()
            .next()
        else {
            return Ok(Vec::new());
        };

        let attrs = Attributes::new(["hardware", "memory"])
            .inventory("total_bytes", mem.total)
            .inventory("swap_total_bytes", mem.swap_total)
            .status("free_bytes", mem.free)
            .status("used_bytes", mem.used)
            .status("swap_free_bytes", mem.swap_free);

        Ok(vec![InventoryItem::Attributes(attrs)])
    }
}

impl InventoryPlugin for MemoryPlugin {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn sections(&self) -> &'static [&'static str] {
        &["memory_info"]
    }

    fn run(&self, input: PluginInput) -> InventoryResult {
        run_collected(self.items(&input))
    }
}
