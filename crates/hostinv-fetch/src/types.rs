//! Source and section types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a section payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// The host itself (agent output)
    Host,
    /// The host's management board
    Management,
}

/// Addressing key for the parsed sections of one host and source type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostKey {
    pub hostname: String,
    pub source_type: SourceType,
}

impl HostKey {
    #[must_use]
    pub fn new(hostname: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            hostname: hostname.into(),
            source_type,
        }
    }
}

/// Parsed, section-keyed payloads delivered by one source
#[derive(Debug, Clone, Default)]
pub struct HostSections {
    /// Section payloads keyed by section name
    pub sections: BTreeMap<String, Value>,
}
