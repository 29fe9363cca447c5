//! hostinv-tree: structured inventory tree storage
//!
//! Hierarchical container for per-host inventory facts: attribute dicts,
//! row tables and named child edges, with normalization, scoped equality
//! and on-disk persistence (JSON plus a compressed sibling).

pub mod error;
pub mod path;
pub mod tree;

pub use error::TreeError;
pub use path::TreePath;
pub use tree::{Row, StructuredTree, gz_sibling};
