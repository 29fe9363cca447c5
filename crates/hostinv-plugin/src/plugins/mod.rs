//! Built-in inventory plugins
//!
//! Each plugin deserializes its section payloads into typed row structs
//! and emits items addressed to the canonical tree paths.

pub mod cpu;
pub mod interfaces;
pub mod memory;
pub mod os;
pub mod packages;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PluginError;
use crate::item::InventoryItem;
use crate::registry::{InventoryResult, PluginInput};

/// Deserialize the rows of one section, empty if the section is absent
pub(crate) fn section_rows<T: DeserializeOwned>(
    input: &PluginInput,
    name: &str,
) -> Result<Vec<T>, PluginError> {
    let Some(payload) = input.sections.get(name) else {
        return Ok(Vec::new());
    };
    let Value::Array(rows) = payload else {
        return Err(PluginError::Parse(format!(
            "section {name} is not a row array"
        )));
    };
    rows.iter()
        .map(|row| {
            serde_json::from_value(row.clone())
                .map_err(|e| PluginError::Parse(format!("section {name}: {e}")))
        })
        .collect()
}

/// Wrap eagerly collected items into the lazy sequence contract
pub(crate) fn run_collected(result: Result<Vec<InventoryItem>, PluginError>) -> InventoryResult {
    match result {
        Ok(items) => Box::new(items.into_iter().map(Ok)),
        Err(e) => Box::new(std::iter::once(Err(e))),
    }
}
