//! Error types for hostinv-plugin

use thiserror::Error;

/// Errors raised by a plugin while its output is drained
#[derive(Error, Debug, Clone)]
pub enum PluginError {
    /// Section payload did not match the shape the plugin expects
    #[error("section parse error: {0}")]
    Parse(String),

    /// Plugin parameters could not be interpreted
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Plugin-internal failure
    #[error("plugin failed: {0}")]
    Failed(String),
}
