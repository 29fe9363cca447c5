//! Error types for hostinv-tree

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving trees
#[derive(Error, Debug, Clone)]
pub enum TreeError {
    /// Reading or writing a tree file failed
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File the operation was performed on
        path: PathBuf,
        /// Underlying I/O error text
        message: String,
    },

    /// Stored tree file does not hold a valid tree
    #[error("malformed tree file {path}: {message}")]
    Format {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying parse error text
        message: String,
    },
}

impl TreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, source: &serde_json::Error) -> Self {
        Self::Format {
            path: path.into(),
            message: source.to_string(),
        }
    }
}
