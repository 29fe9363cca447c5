//! hostinv-core: tree aggregation, per-host runs, persistence and diffing
//!
//! Drives one host's inventory pass: plugin items are folded into the
//! working trees by the aggregator, the orchestrator decides what runs
//! and whether the result is safe to persist, and the persistence layer
//! diffs against the stored tree, archives superseded snapshots and
//! summarizes changes as a monitoring check result.

pub mod aggregate;
pub mod check;
pub mod config;
pub mod error;
pub mod export;
pub mod persist;
pub mod run;

pub use aggregate::{InventoryTrees, TreeAggregator};
pub use check::{CheckOptions, CheckReport, Metric, State, inventory_check};
pub use config::{ExportHookSpec, HostInventoryConfig, RunOptions};
pub use error::{AggregationError, CoreError};
pub use export::{ExportHook, ExportHookRegistry};
pub use persist::{
    InventoryPaths, cleanup_status_data, save_inventory_tree, save_status_data_tree,
    update_status_data,
};
pub use run::{
    ActiveInventoryResult, BatchOutcome, HostRunSummary, InventoryRunner, PluginFailure,
    active_inventory_for,
};
