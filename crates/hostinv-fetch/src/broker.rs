//! In-memory store of parsed sections

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::types::{HostKey, HostSections};

/// Parsed sections keyed by host and source type
///
/// Filled once per run from the source fetch results; plugins look up the
/// sections they declared through [`SectionsBroker::section_input`].
#[derive(Debug, Default)]
pub struct SectionsBroker {
    data: HashMap<HostKey, HostSections>,
}

impl SectionsBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a source's sections under `key`
    pub fn update(&mut self, key: HostKey, sections: HostSections) {
        self.data
            .entry(key)
            .or_default()
            .sections
            .extend(sections.sections);
    }

    /// Look up the sections a plugin declared
    ///
    /// Returns `None` when none of the requested sections are present, so
    /// the caller can skip the plugin for this source type.
    #[must_use]
    pub fn section_input(
        &self,
        key: &HostKey,
        names: &[&str],
    ) -> Option<BTreeMap<String, Value>> {
        let host_sections = self.data.get(key)?;
        let found: BTreeMap<String, Value> = names
            .iter()
            .filter_map(|name| {
                host_sections
                    .sections
                    .get(*name)
                    .map(|payload| ((*name).to_string(), payload.clone()))
            })
            .collect();
        if found.is_empty() { None } else { Some(found) }
    }
}
