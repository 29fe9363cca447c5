//! Operating system inventory plugin

use serde::Deserialize;

use crate::error::PluginError;
use crate::item::{Attributes, InventoryItem};
use crate::plugins::{run_collected, section_rows};
use crate::registry::{InventoryPlugin, InventoryResult, PluginInput};

#[derive(Deserialize)]
struct OsVersionRow {
    name: String,
    version: String,
    #[serde(default)]
    codename: Option<String>,
    platform: String,
    arch: String,
}

#[derive(Deserialize)]
struct KernelRow {
    version: String,
}

#[derive(Deserialize)]
struct UptimeRow {
    total_seconds: u64,
}

/// Collects operating system facts into `software.os`
pub struct OsPlugin;

impl OsPlugin {
    fn items(&self, input: &PluginInput) -> Result<Vec<InventoryItem>, PluginError> {
        let mut attrs = Attributes::new(["software", "os"]);

        if let Some(os) = section_rows::<OsVersionRow>(input, "os_version")?
            .into_iter()
            .next()
        {
            attrs = attrs
                .inventory("name", os.name)
                .inventory("version", os.version)
                .inventory("platform", os.platform)
                .inventory("arch", os.arch);
            if let Some(codename) = os.codename {
                attrs = attrs.inventory("codename", codename);
            }
        }

        if let Some(kernel) = section_rows::<KernelRow>(input, "kernel_info")?
            .into_iter()
            .next()
        {
            attrs = attrs.inventory("kernel_version", kernel.version);
        }

        // Uptime changes every run; it belongs in status data, not history.
        if let Some(uptime) = section_rows::<UptimeRow>(input, "uptime")?
            .into_iter()
            .next()
        {
            attrs = attrs.status("uptime_seconds", uptime.total_seconds);
        }

        Ok(vec![InventoryItem::Attributes(attrs)])
    }
}

impl InventoryPlugin for OsPlugin {
    fn name(&self) -> &'static str {
        "os"
    }

    fn sections(&self) -> &'static [&'static str] {
        &["os_version", "kernel_info", "uptime"]
    }

    fn run(&self, input: PluginInput) -> InventoryResult {
        run_collected(self.items(&input))
    }
}
