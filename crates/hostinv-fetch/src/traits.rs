//! Raw data source traits

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{HostSections, SourceType};

/// One raw data source for a host
#[async_trait]
pub trait RawDataSource: Send + Sync {
    /// Stable identifier used in check output
    fn id(&self) -> String;

    /// Which side of the host this source talks to
    fn source_type(&self) -> SourceType;

    /// Fetch and parse this source's sections
    async fn fetch(&self) -> Result<HostSections, FetchError>;
}

/// Creates the raw data sources for one host
#[async_trait]
pub trait SourceFactory: Send + Sync {
    /// Sources applicable to `hostname`, host-level and management-board
    async fn sources_for(&self, hostname: &str) -> Vec<Box<dyn RawDataSource>>;
}

/// Outcome of one source fetch, kept for the check report
#[derive(Debug, Clone)]
pub struct SourceResult {
    /// Source identifier
    pub id: String,
    /// Fetch outcome; the sections themselves live in the broker
    pub result: Result<(), FetchError>,
}

impl SourceResult {
    #[must_use]
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: Ok(()),
        }
    }

    #[must_use]
    pub fn failed(id: impl Into<String>, error: FetchError) -> Self {
        Self {
            id: id.into(),
            result: Err(error),
        }
    }

    /// Whether the fetch succeeded
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
