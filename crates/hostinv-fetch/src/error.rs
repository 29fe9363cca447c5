//! Error types for hostinv-fetch

use thiserror::Error;

/// Errors that can occur while fetching or parsing raw source data
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// No agent output exists for the host
    #[error("no agent output for {0}")]
    NoAgentOutput(String),

    /// Agent output is older than the configured limit
    #[error("agent output is stale: {age_secs}s old (limit {limit_secs}s)")]
    Stale {
        /// Age of the spool file in seconds
        age_secs: i64,
        /// Configured maximum age in seconds
        limit_secs: i64,
    },

    /// Reading the raw data failed
    #[error("I/O error: {0}")]
    Io(String),

    /// A section payload could not be parsed
    #[error("section parse error in {section}: {message}")]
    Parse {
        /// Section whose payload failed to parse
        section: String,
        /// Underlying parse error text
        message: String,
    },
}
