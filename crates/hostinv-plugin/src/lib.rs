//! hostinv-plugin: inventory plugin contract and built-in plugins
//!
//! Plugins consume parsed section payloads and yield a lazy sequence of
//! inventory items: attribute sets and table rows addressed by tree
//! paths. The registry enumerates everything known to a run.

pub mod error;
pub mod item;
pub mod plugins;
pub mod registry;

pub use error::PluginError;
pub use item::{AttrMap, Attributes, InventoryItem, ItemKind, TableRow};
pub use registry::{InventoryPlugin, InventoryResult, PluginInput, PluginRegistry};
