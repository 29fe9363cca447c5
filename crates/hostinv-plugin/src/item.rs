//! Inventory item model
//!
//! The two item kinds plugins can emit: singleton attribute sets and
//! identity-keyed table rows, both addressed by a tree path.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use hostinv_tree::TreePath;

/// Scalar map used for attributes and columns
pub type AttrMap = BTreeMap<String, Value>;

/// Singleton key/value facts attached to one tree path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    /// Node the attributes are attached to
    pub path: TreePath,
    /// Durable inventory facts
    pub inventory_attributes: AttrMap,
    /// Transient status facts
    pub status_attributes: AttrMap,
}

impl Attributes {
    /// Create an empty attribute set at `path`
    #[must_use]
    pub fn new(path: impl Into<TreePath>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add an inventory attribute
    #[must_use]
    pub fn inventory(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.inventory_attributes.insert(key.to_string(), value.into());
        self
    }

    /// Add a status attribute
    #[must_use]
    pub fn status(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.status_attributes.insert(key.to_string(), value.into());
        self
    }
}

/// One identity-keyed record in the table at one tree path
///
/// The key columns, taken together and order-independent, define row
/// identity within one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    /// Node whose table the row belongs to
    pub path: TreePath,
    /// Columns defining row identity
    pub key_columns: AttrMap,
    /// Durable inventory columns
    pub inventory_columns: AttrMap,
    /// Transient status columns
    pub status_columns: AttrMap,
}

impl TableRow {
    /// Create an empty row for the table at `path`
    #[must_use]
    pub fn new(path: impl Into<TreePath>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a key column
    #[must_use]
    pub fn key(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.key_columns.insert(key.to_string(), value.into());
        self
    }

    /// Add an inventory column
    #[must_use]
    pub fn inventory(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.inventory_columns.insert(key.to_string(), value.into());
        self
    }

    /// Add a status column
    #[must_use]
    pub fn status(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.status_columns.insert(key.to_string(), value.into());
        self
    }
}

/// Item kinds, used for path-kind conflict reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Attributes,
    Table,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Attributes => write!(f, "attributes"),
            ItemKind::Table => write!(f, "table"),
        }
    }
}

/// Tagged item emitted by inventory plugins
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryItem {
    Attributes(Attributes),
    Row(TableRow),
}

impl InventoryItem {
    /// Tree path the item is addressed to
    #[must_use]
    pub fn path(&self) -> &TreePath {
        match self {
            InventoryItem::Attributes(attr) => &attr.path,
            InventoryItem::Row(row) => &row.path,
        }
    }

    /// Which container kind the item claims for its path
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            InventoryItem::Attributes(_) => ItemKind::Attributes,
            InventoryItem::Row(_) => ItemKind::Table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let attr = Attributes::new(["hardware", "cpu"])
            .inventory("cores", 4)
            .status("load", 0.5);
        assert_eq!(attr.path, TreePath::parse("hardware.cpu"));
        assert_eq!(attr.inventory_attributes["cores"], Value::from(4));
        assert_eq!(attr.status_attributes["load"], Value::from(0.5));

        let row = TableRow::new(["software", "packages"])
            .key("name", "bash")
            .inventory("version", "5.0");
        assert_eq!(
            InventoryItem::Row(row).kind(),
            ItemKind::Table
        );
    }
}
