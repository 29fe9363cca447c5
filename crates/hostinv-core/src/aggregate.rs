//! Tree aggregation
//!
//! Folds the item sequences of many plugin invocations into the two
//! working trees of one host run. Two pieces of run-scoped state make
//! this safe: a row identity cache so repeated contributions to the same
//! logical row update it in place, and a path-kind map so a path cannot
//! be both an attribute container and a record container within one run.

use std::collections::HashMap;

use hostinv_plugin::{AttrMap, Attributes, InventoryItem, InventoryResult, ItemKind, TableRow};
use hostinv_tree::{Row, StructuredTree, TreePath};

use crate::error::AggregationError;

/// The two working trees built during one host run
#[derive(Debug, Default)]
pub struct InventoryTrees {
    /// Durable inventory facts, diffed against history
    pub inventory: StructuredTree,
    /// Transient status facts, never diffed
    pub status_data: StructuredTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TreeName {
    Inventory,
    StatusData,
}

/// Folds plugin output into the working trees
///
/// Construct one per host run and discard it afterwards; the caches must
/// never be shared across hosts.
#[derive(Default)]
pub struct TreeAggregator {
    trees: InventoryTrees,
    index_cache: HashMap<(TreePath, TreeName, String), usize>,
    kind_of_path: HashMap<TreePath, ItemKind>,
}

impl TreeAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The inventory working tree, for direct marker writes
    pub fn inventory_mut(&mut self) -> &mut StructuredTree {
        &mut self.trees.inventory
    }

    /// Consume one plugin invocation's output
    ///
    /// The sequence is drained fully before anything is merged; on an
    /// item error or a path-kind conflict nothing from this invocation
    /// reaches either tree.
    ///
    /// # Errors
    /// Returns the conflict or the plugin's own error; the trees are
    /// unchanged in that case.
    pub fn aggregate_results(&mut self, items: InventoryResult) -> Result<(), AggregationError> {
        let (table_rows, attributes) = self.dispatch(items)?;

        for row in table_rows {
            self.integrate_table_row(row);
        }
        for attrs in attributes {
            self.integrate_attributes(attrs);
        }
        Ok(())
    }

    /// Hand over the two working trees, consuming the aggregator
    #[must_use]
    pub fn into_trees(self) -> InventoryTrees {
        self.trees
    }

    fn dispatch(
        &mut self,
        items: InventoryResult,
    ) -> Result<(Vec<TableRow>, Vec<Attributes>), AggregationError> {
        let mut table_rows = Vec::new();
        let mut attributes = Vec::new();

        for item in items {
            let item = item?;
            let expected = *self
                .kind_of_path
                .entry(item.path().clone())
                .or_insert_with(|| item.kind());
            if item.kind() != expected {
                return Err(AggregationError::TypeConflict {
                    path: item.path().clone(),
                    expected,
                    found: item.kind(),
                });
            }
            match item {
                InventoryItem::Attributes(attrs) => attributes.push(attrs),
                InventoryItem::Row(row) => table_rows.push(row),
            }
        }

        Ok((table_rows, attributes))
    }

    fn integrate_attributes(&mut self, attrs: Attributes) {
        if !attrs.inventory_attributes.is_empty() {
            self.trees
                .inventory
                .get_dict(&attrs.path)
                .extend(attrs.inventory_attributes);
        }
        if !attrs.status_attributes.is_empty() {
            self.trees
                .status_data
                .get_dict(&attrs.path)
                .extend(attrs.status_attributes);
        }
    }

    /// Canonical, order-independent form of a row's key columns
    fn row_key(key_columns: &AttrMap) -> String {
        serde_json::to_string(key_columns).unwrap_or_default()
    }

    /// Find the matching table row or create one seeded with the keys
    fn get_row(
        &mut self,
        path: &TreePath,
        tree_name: TreeName,
        row_key: &str,
        key_columns: &AttrMap,
    ) -> &mut Row {
        let table = match tree_name {
            TreeName::Inventory => self.trees.inventory.get_list(path),
            TreeName::StatusData => self.trees.status_data.get_list(path),
        };

        // index to use should we need to create a new row
        let new_row_index = table.len();
        let use_index = *self
            .index_cache
            .entry((path.clone(), tree_name, row_key.to_string()))
            .or_insert(new_row_index);

        if use_index == new_row_index {
            table.push(key_columns.clone());
        }
        &mut table[use_index]
    }

    fn integrate_table_row(&mut self, row: TableRow) {
        let row_key = Self::row_key(&row.key_columns);

        // always, even with no inventory columns: this seeds the keys
        self.get_row(&row.path, TreeName::Inventory, &row_key, &row.key_columns)
            .extend(row.inventory_columns);

        // only if non-empty, so no spurious row appears in status data
        if !row.status_columns.is_empty() {
            self.get_row(&row.path, TreeName::StatusData, &row_key, &row.key_columns)
                .extend(row.status_columns);
        }
    }
}
