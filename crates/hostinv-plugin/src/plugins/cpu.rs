//! CPU inventory plugin

use serde::Deserialize;

use crate::error::PluginError;
use crate::item::{Attributes, InventoryItem};
use crate::plugins::{run_collected, section_rows};
use crate::registry::{InventoryPlugin, InventoryResult, PluginInput};

#[derive(Deserialize)]
struct CpuRow {
    model: String,
    vendor: String,
    physical_cores: u32,
    logical_cores: u32,
    mhz: u32,
}

/// Collects CPU facts into `hardware.cpu`
pub struct CpuPlugin;

impl CpuPlugin {
    fn items(&self, input: &PluginInput) -> Result<Vec<InventoryItem>, PluginError> {
        let Some(cpu) = section_rows::<CpuRow>(input, "cpu_info")?.into_iter().next() else {
            return Ok(Vec::new());
        };

        let attrs = Attributes::new(["hardware", "cpu"])
            .inventory("model", cpu.model)
            .inventory("vendor", cpu.vendor)
            .inventory("cores_physical", cpu.physical_cores)
            .inventory("cores_logical", cpu.logical_cores)
            .inventory("speed_mhz", cpu.mhz);

        Ok(vec![InventoryItem::Attributes(attrs)])
    }
}

impl InventoryPlugin for CpuPlugin {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn sections(&self) -> &'static [&'static str] {
        &["cpu_info"]
    }

    fn run(&self, input: PluginInput) -> InventoryResult {
        run_collected(self.items(&input))
    }
}
