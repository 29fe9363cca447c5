//! Network interface inventory plugin

use serde::Deserialize;

use crate::error::PluginError;
use crate::item::{Attributes, InventoryItem, TableRow};
use crate::plugins::{run_collected, section_rows};
use crate::registry::{InventoryPlugin, InventoryResult, PluginInput};

#[derive(Deserialize)]
struct InterfaceRow {
    interface: String,
    mac: String,
}

#[derive(Deserialize)]
struct AddressRow {
    interface: String,
    address: String,
}

/// Collects network interfaces into the `networking.interfaces` table
///
/// Addresses come and go with DHCP leases, so they land in status data;
/// the interface itself and its MAC are durable inventory.
pub struct InterfacesPlugin;

impl InterfacesPlugin {
    fn items(&self, input: &PluginInput) -> Result<Vec<InventoryItem>, PluginError> {
        let interfaces = section_rows::<InterfaceRow>(input, "interface_details")?;
        let addresses = section_rows::<AddressRow>(input, "interface_addresses")?;

        let mut items = Vec::new();
        for iface in &interfaces {
            let (ipv6, ipv4): (Vec<&str>, Vec<&str>) = addresses
                .iter()
                .filter(|a| a.interface == iface.interface)
                .map(|a| a.address.as_str())
                .partition(|a| a.contains(':'));

            let mut row = TableRow::new(["networking", "interfaces"])
                .key("name", iface.interface.clone())
                .inventory("mac", iface.mac.clone());
            if !ipv4.is_empty() {
                row = row.status("ipv4", ipv4.join(", "));
            }
            if !ipv6.is_empty() {
                row = row.status("ipv6", ipv6.join(", "));
            }
            items.push(InventoryItem::Row(row));
        }

        if !interfaces.is_empty() {
            items.push(InventoryItem::Attributes(
                Attributes::new(["networking"])
                    .inventory("total_interfaces", interfaces.len() as u64),
            ));
        }

        Ok(items)
    }
}

impl InventoryPlugin for InterfacesPlugin {
    fn name(&self) -> &'static str {
        "interfaces"
    }

    fn sections(&self) -> &'static [&'static str] {
        &["interface_details", "interface_addresses"]
    }

    fn run(&self, input: PluginInput) -> InventoryResult {
        run_collected(self.items(&input))
    }
}
