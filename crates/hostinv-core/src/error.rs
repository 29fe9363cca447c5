//! Core error taxonomy

use std::path::PathBuf;

use thiserror::Error;

use hostinv_plugin::{ItemKind, PluginError};
use hostinv_tree::{TreeError, TreePath};

/// Failure of one plugin invocation inside the aggregator
///
/// Either way, nothing from the failed invocation reaches the trees.
#[derive(Error, Debug, Clone)]
pub enum AggregationError {
    /// A path was claimed as both an attribute container and a record
    /// container within one run
    #[error("cannot create {found} node at {path}: this is a {expected} node")]
    TypeConflict {
        /// Path both item kinds were addressed to
        path: TreePath,
        /// Kind first seen at the path
        expected: ItemKind,
        /// Kind of the conflicting item
        found: ItemKind,
    },

    /// The plugin raised while its output was drained
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Errors that abort a host's inventory run
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Loading or saving a tree failed
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Creating, inspecting or moving stored files failed
    #[error("storage error at {path}: {message}")]
    Storage {
        /// Path the operation was performed on
        path: PathBuf,
        /// Underlying error text
        message: String,
    },

    /// Strict mode: plugin failure promoted to a run failure
    #[error("inventory plugin {plugin} failed: {source}")]
    Plugin {
        /// Name of the failed plugin
        plugin: String,
        /// What went wrong
        source: AggregationError,
    },

    /// An export hook failed; its side effects may be partially applied
    #[error("failed to execute export hook {hook}: {message}")]
    ExportHook {
        /// Name of the failed hook
        hook: String,
        /// Hook error text
        message: String,
    },

    /// A host configuration references an export hook nobody registered
    #[error("unknown export hook: {0}")]
    UnknownExportHook(String),

    /// A requested host has no configuration
    #[error("host not configured: {0}")]
    HostNotConfigured(String),
}

impl CoreError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            message: source.to_string(),
        }
    }
}
