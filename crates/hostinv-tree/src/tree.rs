//! Structured inventory tree
//!
//! A tree node carries three things: an attribute dict (singleton facts),
//! a row table (identity-keyed records) and named child nodes. Consumers
//! address nodes by [`TreePath`]; whether a path is used as an attribute
//! container or a record container is enforced by the aggregation layer,
//! not here.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::TreeError;
use crate::path::TreePath;

/// One identity-keyed record within a table
pub type Row = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Node {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    table: Vec<Row>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    nodes: BTreeMap<String, Node>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.table.is_empty()
            && self.nodes.values().all(Node::is_empty)
    }

    fn count_entries(&self) -> usize {
        self.attributes.len()
            + self.table.iter().map(Row::len).sum::<usize>()
            + self.nodes.values().map(Node::count_entries).sum::<usize>()
    }

    fn normalize(&mut self) {
        for child in self.nodes.values_mut() {
            child.normalize();
        }
        self.nodes.retain(|_, child| !child.is_empty());
        // Row order carries no meaning; sorting by the canonical form makes
        // structural equality independent of insertion order.
        self.table
            .sort_by_cached_key(|row| serde_json::to_string(row).unwrap_or_default());
    }
}

/// Hierarchical inventory tree for one host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredTree {
    root: Node,
}

impl StructuredTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, path: &TreePath) -> Option<&Node> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.nodes.get(segment)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, path: &TreePath) -> &mut Node {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.nodes.entry(segment.clone()).or_default();
        }
        node
    }

    /// Create-or-get the attribute dict at `path`
    pub fn get_dict(&mut self, path: &TreePath) -> &mut BTreeMap<String, Value> {
        &mut self.node_mut(path).attributes
    }

    /// Create-or-get the row table at `path`
    pub fn get_list(&mut self, path: &TreePath) -> &mut Vec<Row> {
        &mut self.node_mut(path).table
    }

    /// Whether the node at `path` has a child edge `name`
    #[must_use]
    pub fn has_child(&self, path: &TreePath, name: &str) -> bool {
        self.node(path).is_some_and(|n| n.nodes.contains_key(name))
    }

    /// Structural canonicalization: prune empty nodes, sort table rows
    pub fn normalize(&mut self) {
        self.root.normalize();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of scalar entries (attribute values plus row cells)
    #[must_use]
    pub fn count_entries(&self) -> usize {
        self.root.count_entries()
    }

    /// Deep structural equality, optionally restricted to top-level edges
    ///
    /// With `edges`, only the named top-level subtrees are compared; an
    /// edge missing on both sides counts as equal.
    #[must_use]
    pub fn is_equal(&self, other: &Self, edges: Option<&[&str]>) -> bool {
        match edges {
            None => self.root == other.root,
            Some(names) => names
                .iter()
                .all(|name| self.root.nodes.get(*name) == other.root.nodes.get(*name)),
        }
    }

    /// Raw export of the whole tree as a JSON value
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.root).unwrap_or_default()
    }

    /// File path of the stored tree for `host` under `dir`
    #[must_use]
    pub fn storage_path(dir: &Path, host: &str) -> PathBuf {
        dir.join(host)
    }

    /// Load a tree from `path`, falling back to the `.gz` sibling
    ///
    /// A missing file yields an empty tree.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not hold a
    /// valid tree.
    pub fn load_from(path: &Path) -> Result<Self, TreeError> {
        if path.exists() {
            let data = fs::read_to_string(path).map_err(|e| TreeError::io(path, &e))?;
            return serde_json::from_str(&data).map_err(|e| TreeError::format(path, &e));
        }

        let gz = gz_sibling(path);
        if gz.exists() {
            let file = fs::File::open(&gz).map_err(|e| TreeError::io(&gz, &e))?;
            let mut data = String::new();
            GzDecoder::new(file)
                .read_to_string(&mut data)
                .map_err(|e| TreeError::io(&gz, &e))?;
            return serde_json::from_str(&data).map_err(|e| TreeError::format(&gz, &e));
        }

        Ok(Self::new())
    }

    /// Save to `<dir>/<host>` plus the compressed `.gz` sibling
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or either file
    /// cannot be written.
    pub fn save_to(&self, dir: &Path, host: &str) -> Result<PathBuf, TreeError> {
        fs::create_dir_all(dir).map_err(|e| TreeError::io(dir, &e))?;
        let path = Self::storage_path(dir, host);
        let data = serde_json::to_string(self).map_err(|e| TreeError::format(&path, &e))?;
        fs::write(&path, &data).map_err(|e| TreeError::io(&path, &e))?;

        let gz = gz_sibling(&path);
        let file = fs::File::create(&gz).map_err(|e| TreeError::io(&gz, &e))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data.as_bytes())
            .map_err(|e| TreeError::io(&gz, &e))?;
        encoder.finish().map_err(|e| TreeError::io(&gz, &e))?;

        debug!(path = %path.display(), "saved tree");
        Ok(path)
    }
}

/// The `.gz` sibling of a tree file
#[must_use]
pub fn gz_sibling(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.gz", path.display()))
}
