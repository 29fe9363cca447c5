//! Software package inventory plugin

use serde::Deserialize;

use crate::error::PluginError;
use crate::item::{InventoryItem, TableRow};
use crate::plugins::{run_collected, section_rows};
use crate::registry::{InventoryPlugin, InventoryResult, PluginInput};

#[derive(Deserialize)]
struct PackageRow {
    name: String,
    version: String,
    #[serde(default)]
    arch: Option<String>,
}

#[derive(Deserialize, Default)]
struct PackageParams {
    /// Packages whose name starts with one of these prefixes are skipped
    #[serde(default)]
    exclude_prefixes: Vec<String>,
}

/// Collects installed packages into the `software.packages` table
///
/// Row identity is the package name plus architecture; deb and rpm
/// sections feed the same table.
pub struct PackagesPlugin;

impl PackagesPlugin {
    fn items(&self, input: &PluginInput) -> Result<Vec<InventoryItem>, PluginError> {
        let params: PackageParams = match &input.params {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| PluginError::InvalidParams(e.to_string()))?,
            None => PackageParams::default(),
        };

        let mut items = Vec::new();
        for (section, source) in [("deb_packages", "deb"), ("rpm_packages", "rpm")] {
            for pkg in section_rows::<PackageRow>(input, section)? {
                if params
                    .exclude_prefixes
                    .iter()
                    .any(|prefix| pkg.name.starts_with(prefix))
                {
                    continue;
                }
                let mut row = TableRow::new(["software", "packages"])
                    .key("name", pkg.name)
                    .inventory("version", pkg.version)
                    .inventory("source", source);
                if let Some(arch) = pkg.arch {
                    row = row.key("arch", arch);
                }
                items.push(InventoryItem::Row(row));
            }
        }
        Ok(items)
    }
}

impl InventoryPlugin for PackagesPlugin {
    fn name(&self) -> &'static str {
        "packages"
    }

    fn sections(&self) -> &'static [&'static str] {
        &["deb_packages", "rpm_packages"]
    }

    fn ruleset_name(&self) -> Option<&'static str> {
        Some("software_packages")
    }

    fn run(&self, input: PluginInput) -> InventoryResult {
        run_collected(self.items(&input))
    }
}
