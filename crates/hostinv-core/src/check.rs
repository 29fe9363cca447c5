//! Monitoring check summarization of an inventory run
//!
//! Maps an inventory pass onto a check result: persist when safe, run
//! export hooks, then derive the state from the configured change
//! thresholds and the health of the raw data sources. Software and
//! hardware changes are judged by two independent scoped comparisons
//! against the previously stored tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use hostinv_tree::TreePath;

use crate::config::HostInventoryConfig;
use crate::error::CoreError;
use crate::export::ExportHookRegistry;
use crate::persist::{self, InventoryPaths};
use crate::run::ActiveInventoryResult;

/// Monitoring state of a check result
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[default]
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl State {
    /// Numeric state as reported to the monitoring core
    #[must_use]
    pub const fn as_int(self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Crit => 2,
            State::Unknown => 3,
        }
    }

    /// State from its numeric form; out-of-range values map to unknown
    #[must_use]
    pub const fn from_int(value: u8) -> Self {
        match value {
            0 => State::Ok,
            1 => State::Warn,
            2 => State::Crit,
            _ => State::Unknown,
        }
    }

    /// Worst of two states
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Marker suffix appended to escalated messages
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            State::Ok => "",
            State::Warn => "(!)",
            State::Crit => "(!!)",
            State::Unknown => "(?)",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Ok => write!(f, "OK"),
            State::Warn => write!(f, "WARN"),
            State::Crit => write!(f, "CRIT"),
            State::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One performance metric of a check result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub warn: Option<f64>,
    pub crit: Option<f64>,
}

impl Metric {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            warn: None,
            crit: None,
        }
    }
}

/// Escalation thresholds for the inventory check
///
/// Each threshold is a monitoring state; `Ok` disables escalation for
/// that condition while the informational message is still emitted.
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    /// State on hardware changes
    pub hw_changes: State,
    /// State on software changes
    pub sw_changes: State,
    /// State when software package information is missing
    pub sw_missing: State,
    /// Floor state when a raw data source failed
    pub fail_status: State,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            hw_changes: State::Ok,
            sw_changes: State::Ok,
            sw_missing: State::Ok,
            fail_status: State::Warn,
        }
    }
}

/// Check-style report of one inventory run
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub state: State,
    pub short_messages: Vec<String>,
    pub long_messages: Vec<String>,
    pub metrics: Vec<Metric>,
}

impl CheckReport {
    /// Append a message, escalating the overall state
    ///
    /// Escalated messages carry their state marker.
    fn add(&mut self, state: State, message: impl Into<String>) {
        let mut message = message.into();
        message.push_str(state.marker());
        self.short_messages.push(message);
        self.state = self.state.worst(state);
    }
}

/// Summarize an inventory run as a monitoring check result
///
/// # Errors
/// Returns an error when persistence or an export hook fails; everything
/// else is expressed through the report's state and messages.
pub fn inventory_check(
    paths: &InventoryPaths,
    config: &HostInventoryConfig,
    hooks: &ExportHookRegistry,
    result: &ActiveInventoryResult,
    options: &CheckOptions,
) -> Result<CheckReport, CoreError> {
    let mut report = CheckReport::default();
    let trees = &result.trees;

    let old_tree = if result.safe_to_write {
        persist::save_inventory_tree(paths, &config.name, &trees.inventory)?
    } else {
        report.add(State::Warn, "cannot update tree");
        None
    };

    hooks.run_all(config, &trees.inventory)?;

    if trees.inventory.is_empty() && trees.status_data.is_empty() {
        report.add(State::Ok, "found no data");
    } else {
        let inventory_entries = trees.inventory.count_entries();
        report.add(
            State::Ok,
            format!("found {inventory_entries} inventory entries"),
        );
        report
            .metrics
            .push(Metric::new("inventory_entries", inventory_entries as f64));

        // the software node always exists: the cluster marker lives there
        if !trees
            .inventory
            .has_child(&TreePath::parse("software"), "packages")
        {
            report.add(options.sw_missing, "software packages information is missing");
        }

        if let Some(old_tree) = &old_tree {
            if !old_tree.is_equal(&trees.inventory, Some(&["software"])) {
                report.add(options.sw_changes, "software changes");
            }
            if !old_tree.is_equal(&trees.inventory, Some(&["hardware"])) {
                report.add(options.hw_changes, "hardware changes");
            }
        }

        if !trees.status_data.is_empty() {
            let status_entries = trees.status_data.count_entries();
            report.add(State::Ok, format!("found {status_entries} status entries"));
            report
                .metrics
                .push(Metric::new("status_entries", status_entries as f64));
        }
    }

    for source in &result.source_results {
        if let Err(e) = &source.result {
            // a failed source escalates to at least the configured floor
            report.state = report.state.worst(options.fail_status);
            report.short_messages.push(format!("[{}] {e}", source.id));
        }
    }

    for failure in &result.plugin_failures {
        report
            .long_messages
            .push(format!("plugin {}: {}", failure.plugin, failure.error));
    }

    Ok(report)
}
