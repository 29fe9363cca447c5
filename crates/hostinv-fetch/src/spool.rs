//! Spool directory source
//!
//! An out-of-band agent transport drops one output file per host into a
//! spool directory: `<<<section>>>` headers framing JSON rows, one row
//! per line. Files older than the configured limit are rejected as stale
//! rather than silently feeding outdated facts into the tree.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::traits::{RawDataSource, SourceFactory};
use crate::types::{HostSections, SourceType};

/// Reads pre-collected agent output for one host from a spool file
pub struct SpoolSource {
    path: PathBuf,
    hostname: String,
    source_type: SourceType,
    max_age_secs: Option<i64>,
}

impl SpoolSource {
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        hostname: impl Into<String>,
        source_type: SourceType,
        max_age_secs: Option<i64>,
    ) -> Self {
        Self {
            path: path.into(),
            hostname: hostname.into(),
            source_type,
            max_age_secs,
        }
    }

    fn check_age(&self, modified: SystemTime) -> Result<(), FetchError> {
        let Some(limit) = self.max_age_secs else {
            return Ok(());
        };
        let mtime: DateTime<Utc> = modified.into();
        let age = (Utc::now() - mtime).num_seconds();
        if age > limit {
            return Err(FetchError::Stale {
                age_secs: age,
                limit_secs: limit,
            });
        }
        Ok(())
    }
}

/// Parse `<<<section>>>`-framed agent output into section payloads
fn parse_agent_output(text: &str) -> Result<BTreeMap<String, Value>, FetchError> {
    let mut sections: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix("<<<").and_then(|l| l.strip_suffix(">>>")) {
            sections.entry(name.to_string()).or_default();
            current = Some(name.to_string());
            continue;
        }
        let Some(name) = &current else {
            return Err(FetchError::Parse {
                section: "<preamble>".to_string(),
                message: "data before first section header".to_string(),
            });
        };
        let row = serde_json::from_str(line).map_err(|e| FetchError::Parse {
            section: name.clone(),
            message: e.to_string(),
        })?;
        if let Some(rows) = sections.get_mut(name) {
            rows.push(row);
        }
    }

    Ok(sections
        .into_iter()
        .map(|(name, rows)| (name, Value::Array(rows)))
        .collect())
}

#[async_trait]
impl RawDataSource for SpoolSource {
    fn id(&self) -> String {
        match self.source_type {
            SourceType::Host => format!("agent/{}", self.hostname),
            SourceType::Management => format!("mgmt/{}", self.hostname),
        }
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<HostSections, FetchError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NoAgentOutput(self.hostname.clone()));
            }
            Err(e) => return Err(FetchError::Io(e.to_string())),
        };
        let modified = metadata.modified().map_err(|e| FetchError::Io(e.to_string()))?;
        self.check_age(modified)?;

        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;
        let sections = parse_agent_output(&text)?;

        debug!(sections = sections.len(), "parsed agent output");
        Ok(HostSections { sections })
    }
}

/// Builds spool sources per host
///
/// `<dir>/<host>` holds the host-level agent output; an optional
/// `<dir>/<host>.mgmt` file supplies management-board sections.
#[derive(Debug, Clone)]
pub struct SpoolSourceFactory {
    dir: PathBuf,
    max_age_secs: Option<i64>,
}

impl SpoolSourceFactory {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, max_age_secs: Option<i64>) -> Self {
        Self {
            dir: dir.into(),
            max_age_secs,
        }
    }
}

#[async_trait]
impl SourceFactory for SpoolSourceFactory {
    async fn sources_for(&self, hostname: &str) -> Vec<Box<dyn RawDataSource>> {
        let mut sources: Vec<Box<dyn RawDataSource>> = vec![Box::new(SpoolSource::new(
            self.dir.join(hostname),
            hostname,
            SourceType::Host,
            self.max_age_secs,
        ))];

        let mgmt = self.dir.join(format!("{hostname}.mgmt"));
        if mgmt.exists() {
            sources.push(Box::new(SpoolSource::new(
                mgmt,
                hostname,
                SourceType::Management,
                self.max_age_secs,
            )));
        }
        sources
    }
}
