//! Per-host inventory runs and the batch loop
//!
//! A real host is fetched, run through every applicable plugin and
//! normalized; a cluster host gets a minimal membership tree and never
//! touches the raw data layer. The batch runner isolates host failures
//! from each other and parallelizes hosts in bounded batches.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use hostinv_fetch::{
    HostKey, RawDataSource, SectionsBroker, SourceFactory, SourceResult, SourceType,
};
use hostinv_plugin::{PluginInput, PluginRegistry};
use hostinv_tree::{Row, StructuredTree, TreePath};

use crate::aggregate::{InventoryTrees, TreeAggregator};
use crate::config::{HostInventoryConfig, RunOptions};
use crate::error::{AggregationError, CoreError};
use crate::export::ExportHookRegistry;
use crate::persist::{self, InventoryPaths};

/// Result of one host's inventory pass
#[derive(Debug)]
pub struct ActiveInventoryResult {
    /// The freshly built working trees
    pub trees: InventoryTrees,
    /// Per-source fetch outcomes
    pub source_results: Vec<SourceResult>,
    /// False when any source failed or the run was scoped to a section
    /// selection; such a tree must not overwrite the stored one
    pub safe_to_write: bool,
    /// Plugins that failed during this run
    pub plugin_failures: Vec<PluginFailure>,
}

/// Record of one failed plugin invocation
#[derive(Debug, Clone)]
pub struct PluginFailure {
    /// Name of the failed plugin
    pub plugin: String,
    /// What went wrong
    pub error: AggregationError,
}

/// Run the inventory pass for one host
///
/// # Errors
/// Returns an error only for strict-mode escalations; plugin and source
/// failures are otherwise recorded in the result.
#[instrument(skip_all, fields(host = %config.name))]
pub async fn active_inventory_for(
    config: &HostInventoryConfig,
    registry: &PluginRegistry,
    sources: &dyn SourceFactory,
    options: &RunOptions,
) -> Result<ActiveInventoryResult, CoreError> {
    if config.is_cluster {
        return Ok(ActiveInventoryResult {
            trees: inventory_for_cluster(config),
            source_results: Vec::new(),
            safe_to_write: true,
            plugin_failures: Vec::new(),
        });
    }

    let host_sources = sources.sources_for(&config.name).await;
    let (broker, source_results) = fetch_sections(&config.name, host_sources, options).await;

    let (trees, plugin_failures) = inventory_for_realhost(config, registry, &broker, options)?;

    let all_sources_ok = source_results.iter().all(SourceResult::is_ok);
    Ok(ActiveInventoryResult {
        trees,
        source_results,
        safe_to_write: all_sources_ok && options.selected_sections.is_none(),
        plugin_failures,
    })
}

/// Fetch every source and fold its parsed sections into a broker
async fn fetch_sections(
    hostname: &str,
    sources: Vec<Box<dyn RawDataSource>>,
    options: &RunOptions,
) -> (SectionsBroker, Vec<SourceResult>) {
    let mut broker = SectionsBroker::new();
    let mut results = Vec::with_capacity(sources.len());

    for source in sources {
        let key = HostKey::new(hostname, source.source_type());
        match source.fetch().await {
            Ok(mut sections) => {
                if let Some(selected) = &options.selected_sections {
                    sections.sections.retain(|name, _| selected.contains(name));
                }
                broker.update(key, sections);
                results.push(SourceResult::ok(source.id()));
            }
            Err(e) => {
                warn!(source = %source.id(), error = %e, "source fetch failed");
                results.push(SourceResult::failed(source.id(), e));
            }
        }
    }

    (broker, results)
}

fn cluster_path() -> TreePath {
    TreePath::parse("software.applications.hostinv.cluster")
}

fn cluster_nodes_path() -> TreePath {
    TreePath::parse("software.applications.hostinv.cluster.nodes")
}

fn set_cluster_property(tree: &mut StructuredTree, config: &HostInventoryConfig) {
    tree.get_dict(&cluster_path())
        .insert("is_cluster".to_string(), Value::Bool(config.is_cluster));
}

/// Build the minimal inventory tree for a cluster host
///
/// Only the membership marker and the member node list; the status tree
/// stays empty and no raw data is fetched.
fn inventory_for_cluster(config: &HostInventoryConfig) -> InventoryTrees {
    let mut trees = InventoryTrees::default();
    set_cluster_property(&mut trees.inventory, config);

    if !config.nodes.is_empty() {
        let table = trees.inventory.get_list(&cluster_nodes_path());
        for node_name in &config.nodes {
            let mut row = Row::new();
            row.insert("name".to_string(), Value::String(node_name.clone()));
            table.push(row);
        }
    }

    trees.inventory.normalize();
    trees
}

/// Run every applicable plugin for a real host and normalize the trees
fn inventory_for_realhost(
    config: &HostInventoryConfig,
    registry: &PluginRegistry,
    broker: &SectionsBroker,
    options: &RunOptions,
) -> Result<(InventoryTrees, Vec<PluginFailure>), CoreError> {
    let mut aggregator = TreeAggregator::new();
    set_cluster_property(aggregator.inventory_mut(), config);
    let mut failures = Vec::new();

    for plugin in registry.iter() {
        if let Some(only) = &options.run_only_plugins
            && !only.contains(plugin.name())
        {
            continue;
        }

        for source_type in [SourceType::Host, SourceType::Management] {
            let key = HostKey::new(config.name.clone(), source_type);
            let Some(sections) = broker.section_input(&key, plugin.sections()) else {
                debug!(plugin = %plugin.name(), source_type = ?source_type, "skipped (no data)");
                continue;
            };

            let params = plugin
                .ruleset_name()
                .and_then(|ruleset| config.inventory_parameters(ruleset))
                .cloned();
            let input = PluginInput { sections, params };

            match aggregator.aggregate_results(plugin.run(input)) {
                Ok(()) => debug!(plugin = %plugin.name(), "ok"),
                Err(e) if options.strict => {
                    return Err(CoreError::Plugin {
                        plugin: plugin.name().to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(plugin = %plugin.name(), error = %e, "plugin failed");
                    failures.push(PluginFailure {
                        plugin: plugin.name().to_string(),
                        error: e,
                    });
                }
            }
        }
    }

    let mut trees = aggregator.into_trees();
    trees.inventory.normalize();
    trees.status_data.normalize();
    Ok((trees, failures))
}

/// Summary of one finished host run
#[derive(Debug, Clone)]
pub struct HostRunSummary {
    /// Entries in the inventory tree
    pub inventory_entries: usize,
    /// Entries in the status-data tree
    pub status_entries: usize,
    /// Number of failed sources
    pub failed_sources: usize,
    /// Number of failed plugins
    pub failed_plugins: usize,
    /// Whether the inventory tree was persisted
    pub persisted: bool,
}

/// Outcome of a batch over many hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOutcome {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Shared dependencies for inventory runs over many hosts
pub struct InventoryRunner {
    pub registry: Arc<PluginRegistry>,
    pub sources: Arc<dyn SourceFactory>,
    pub export_hooks: Arc<ExportHookRegistry>,
    pub paths: InventoryPaths,
    /// Hosts processed in parallel per batch
    pub batch_size: usize,
}

impl InventoryRunner {
    /// Full collect pipeline for one host: inventory pass, persistence,
    /// status data, export hooks
    ///
    /// # Errors
    /// Returns an error when persistence or an export hook fails, or on
    /// strict-mode escalations.
    #[instrument(skip_all, fields(host = %config.name))]
    pub async fn collect_host(
        &self,
        config: &HostInventoryConfig,
        options: &RunOptions,
    ) -> Result<HostRunSummary, CoreError> {
        let result =
            active_inventory_for(config, &self.registry, self.sources.as_ref(), options).await?;

        if result.safe_to_write {
            persist::save_inventory_tree(&self.paths, &config.name, &result.trees.inventory)?;
        } else {
            warn!("tree not persisted: source failure or partial section selection");
        }
        persist::update_status_data(&self.paths, config, &result.trees)?;
        self.export_hooks.run_all(config, &result.trees.inventory)?;

        let summary = HostRunSummary {
            inventory_entries: result.trees.inventory.count_entries(),
            status_entries: result.trees.status_data.count_entries(),
            failed_sources: result
                .source_results
                .iter()
                .filter(|r| !r.is_ok())
                .count(),
            failed_plugins: result.plugin_failures.len(),
            persisted: result.safe_to_write,
        };
        info!(
            inventory_entries = summary.inventory_entries,
            status_entries = summary.status_entries,
            "inventory run finished"
        );
        Ok(summary)
    }

    /// Collect a batch of hosts, isolating failures per host
    ///
    /// Hosts run in parallel chunks of `batch_size`; each host's file
    /// writes stay within its own task, so no two writers ever touch the
    /// same host's files.
    ///
    /// # Errors
    /// Only strict mode turns a host failure into a batch failure.
    pub async fn collect_many(
        self: Arc<Self>,
        configs: Vec<HostInventoryConfig>,
        options: RunOptions,
    ) -> Result<BatchOutcome, CoreError> {
        let mut outcome = BatchOutcome {
            total: configs.len(),
            ..BatchOutcome::default()
        };
        let options = Arc::new(options);

        for batch in configs.chunks(self.batch_size.max(1)) {
            let mut handles = Vec::new();
            for config in batch {
                let runner = Arc::clone(&self);
                let options = Arc::clone(&options);
                let config = config.clone();
                let name = config.name.clone();
                let handle =
                    tokio::spawn(async move { runner.collect_host(&config, &options).await });
                handles.push((name, handle));
            }

            for (name, handle) in handles {
                match handle.await {
                    Ok(Ok(_)) => outcome.completed += 1,
                    Ok(Err(e)) => {
                        if options.strict {
                            return Err(e);
                        }
                        outcome.failed += 1;
                        error!(host = %name, error = %e, "inventory run failed");
                    }
                    Err(e) => {
                        outcome.failed += 1;
                        error!(host = %name, error = %e, "inventory task panicked");
                    }
                }
            }
        }

        info!(
            total = outcome.total,
            completed = outcome.completed,
            failed = outcome.failed,
            "batch finished"
        );
        Ok(outcome)
    }
}
