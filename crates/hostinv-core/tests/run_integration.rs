//! End-to-end inventory runs against in-memory sources

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use hostinv_core::{
    CheckOptions, CoreError, ExportHookRegistry, HostInventoryConfig, InventoryPaths,
    InventoryRunner, RunOptions, State, active_inventory_for, inventory_check,
};
use hostinv_fetch::{FetchError, HostSections, RawDataSource, SourceFactory, SourceType};
use hostinv_plugin::{InventoryPlugin, InventoryResult, PluginError, PluginInput, PluginRegistry};
use hostinv_tree::TreePath;

struct StaticSource {
    id: &'static str,
    source_type: SourceType,
    outcome: Result<Vec<(&'static str, Value)>, FetchError>,
}

#[async_trait]
impl RawDataSource for StaticSource {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn fetch(&self) -> Result<HostSections, FetchError> {
        match &self.outcome {
            Ok(entries) => Ok(HostSections {
                sections: entries
                    .iter()
                    .map(|(name, payload)| ((*name).to_string(), payload.clone()))
                    .collect(),
            }),
            Err(e) => Err(e.clone()),
        }
    }
}

struct StaticFactory {
    agent_sections: Vec<(&'static str, Value)>,
    fail_agent: bool,
}

impl StaticFactory {
    fn healthy() -> Self {
        Self {
            agent_sections: sample_sections(),
            fail_agent: false,
        }
    }

    fn failing() -> Self {
        Self {
            agent_sections: Vec::new(),
            fail_agent: true,
        }
    }
}

#[async_trait]
impl SourceFactory for StaticFactory {
    async fn sources_for(&self, hostname: &str) -> Vec<Box<dyn RawDataSource>> {
        let outcome = if self.fail_agent {
            Err(FetchError::NoAgentOutput(hostname.to_string()))
        } else {
            Ok(self.agent_sections.clone())
        };
        vec![Box::new(StaticSource {
            id: "agent",
            source_type: SourceType::Host,
            outcome,
        })]
    }
}

fn sample_sections() -> Vec<(&'static str, Value)> {
    vec![
        (
            "cpu_info",
            json!([{
                "model": "EPYC 7543",
                "vendor": "AMD",
                "physical_cores": 32,
                "logical_cores": 64,
                "mhz": 2800
            }]),
        ),
        (
            "memory_info",
            json!([{
                "total": 1024, "free": 512, "used": 512,
                "swap_total": 0, "swap_free": 0
            }]),
        ),
        (
            "deb_packages",
            json!([{"name": "bash", "version": "5.2", "arch": "amd64"}]),
        ),
    ]
}

#[tokio::test]
async fn test_real_host_run_builds_both_trees() {
    let config = HostInventoryConfig::new("web01");
    let registry = PluginRegistry::builtin();
    let factory = StaticFactory::healthy();

    let mut result = active_inventory_for(&config, &registry, &factory, &RunOptions::default())
        .await
        .unwrap();

    assert!(result.safe_to_write);
    assert!(result.plugin_failures.is_empty());

    let inventory = &mut result.trees.inventory;
    assert_eq!(
        inventory.get_dict(&TreePath::parse("hardware.cpu"))["cores_physical"],
        Value::from(32)
    );
    let packages = inventory.get_list(&TreePath::parse("software.packages"));
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["name"], Value::from("bash"));
    assert_eq!(
        inventory.get_dict(&TreePath::parse("software.applications.hostinv.cluster"))
            ["is_cluster"],
        Value::Bool(false)
    );

    let status = &mut result.trees.status_data;
    assert_eq!(
        status.get_dict(&TreePath::parse("hardware.memory"))["free_bytes"],
        Value::from(512)
    );
}

#[tokio::test]
async fn test_cluster_host_never_fetches() {
    let config = HostInventoryConfig::cluster("db", vec!["db1".to_string(), "db2".to_string()]);
    let registry = PluginRegistry::builtin();
    // the factory would fail; the cluster branch must not reach it
    let factory = StaticFactory::failing();

    let mut result = active_inventory_for(&config, &registry, &factory, &RunOptions::default())
        .await
        .unwrap();

    assert!(result.safe_to_write);
    assert!(result.source_results.is_empty());
    assert!(result.trees.status_data.is_empty());
    let nodes = result
        .trees
        .inventory
        .get_list(&TreePath::parse("software.applications.hostinv.cluster.nodes"));
    assert_eq!(nodes.len(), 2);
}

#[tokio::test]
async fn test_failed_source_gates_writing() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(InventoryRunner {
        registry: Arc::new(PluginRegistry::builtin()),
        sources: Arc::new(StaticFactory::failing()),
        export_hooks: Arc::new(ExportHookRegistry::new()),
        paths: InventoryPaths::under(dir.path()),
        batch_size: 1,
    });
    let config = HostInventoryConfig::new("web01");

    let summary = runner
        .collect_host(&config, &RunOptions::default())
        .await
        .unwrap();

    assert!(!summary.persisted);
    assert_eq!(summary.failed_sources, 1);
    assert!(!runner.paths.inventory_dir.join("web01").exists());
}

#[tokio::test]
async fn test_section_selection_gates_writing() {
    let config = HostInventoryConfig::new("web01");
    let registry = PluginRegistry::builtin();
    let factory = StaticFactory::healthy();
    let options = RunOptions {
        selected_sections: Some(BTreeSet::from(["cpu_info".to_string()])),
        ..RunOptions::default()
    };

    let mut result = active_inventory_for(&config, &registry, &factory, &options)
        .await
        .unwrap();

    assert!(!result.safe_to_write);
    // only the selected section reached the plugins
    assert!(
        result
            .trees
            .inventory
            .get_list(&TreePath::parse("software.packages"))
            .is_empty()
    );
    assert!(
        !result
            .trees
            .inventory
            .get_dict(&TreePath::parse("hardware.cpu"))
            .is_empty()
    );
}

#[tokio::test]
async fn test_run_only_plugins_filter() {
    let config = HostInventoryConfig::new("web01");
    let registry = PluginRegistry::builtin();
    let factory = StaticFactory::healthy();
    let options = RunOptions {
        run_only_plugins: Some(BTreeSet::from(["cpu".to_string()])),
        ..RunOptions::default()
    };

    let mut result = active_inventory_for(&config, &registry, &factory, &options)
        .await
        .unwrap();

    assert!(
        result
            .trees
            .inventory
            .get_list(&TreePath::parse("software.packages"))
            .is_empty()
    );
    assert!(
        !result
            .trees
            .inventory
            .get_dict(&TreePath::parse("hardware.cpu"))
            .is_empty()
    );
}

struct BrokenPlugin;

impl InventoryPlugin for BrokenPlugin {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn sections(&self) -> &'static [&'static str] {
        &["cpu_info"]
    }

    fn run(&self, _input: PluginInput) -> InventoryResult {
        Box::new(std::iter::once(Err(PluginError::Failed(
            "section exploded".to_string(),
        ))))
    }
}

#[tokio::test]
async fn test_plugin_failure_is_recorded_not_fatal() {
    let config = HostInventoryConfig::new("web01");
    let mut registry = PluginRegistry::builtin();
    registry.register(Arc::new(BrokenPlugin));
    let factory = StaticFactory::healthy();

    let result = active_inventory_for(&config, &registry, &factory, &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(result.plugin_failures.len(), 1);
    assert_eq!(result.plugin_failures[0].plugin, "broken");
    // the other plugins still contributed
    assert!(result.trees.inventory.count_entries() > 1);
}

#[tokio::test]
async fn test_strict_mode_propagates_plugin_failure() {
    let config = HostInventoryConfig::new("web01");
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(BrokenPlugin));
    let factory = StaticFactory::healthy();
    let options = RunOptions {
        strict: true,
        ..RunOptions::default()
    };

    let err = active_inventory_for(&config, &registry, &factory, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Plugin { plugin, .. } if plugin == "broken"));
}

#[tokio::test]
async fn test_check_reports_software_changes() {
    let dir = tempfile::tempdir().unwrap();
    let paths = InventoryPaths::under(dir.path());
    let config = HostInventoryConfig::new("web01");
    let registry = PluginRegistry::builtin();
    let hooks = ExportHookRegistry::new();
    let check_options = CheckOptions {
        sw_changes: State::Warn,
        ..CheckOptions::default()
    };

    let first = active_inventory_for(
        &config,
        &registry,
        &StaticFactory::healthy(),
        &RunOptions::default(),
    )
    .await
    .unwrap();
    let report = inventory_check(&paths, &config, &hooks, &first, &check_options).unwrap();
    assert!(
        report
            .short_messages
            .iter()
            .any(|m| m.contains("inventory entries"))
    );

    // same data again: no change messages
    let second = active_inventory_for(
        &config,
        &registry,
        &StaticFactory::healthy(),
        &RunOptions::default(),
    )
    .await
    .unwrap();
    let report = inventory_check(&paths, &config, &hooks, &second, &check_options).unwrap();
    assert!(
        !report
            .short_messages
            .iter()
            .any(|m| m.contains("software changes"))
    );
    assert_eq!(report.state, State::Ok);

    // a new package version: software changed, hardware did not
    let mut changed = StaticFactory::healthy();
    changed.agent_sections[2] = (
        "deb_packages",
        json!([{"name": "bash", "version": "5.3", "arch": "amd64"}]),
    );
    let third = active_inventory_for(&config, &registry, &changed, &RunOptions::default())
        .await
        .unwrap();
    let report = inventory_check(&paths, &config, &hooks, &third, &check_options).unwrap();
    assert!(report.short_messages.contains(&"software changes(!)".to_string()));
    assert!(
        !report
            .short_messages
            .iter()
            .any(|m| m.contains("hardware changes"))
    );
    assert_eq!(report.state, State::Warn);

    // the superseded snapshot was archived
    let archived: Vec<_> = std::fs::read_dir(paths.archive_dir.join("web01"))
        .unwrap()
        .collect();
    assert_eq!(archived.len(), 1);
}

#[tokio::test]
async fn test_check_on_failed_source_cannot_update_tree() {
    let dir = tempfile::tempdir().unwrap();
    let paths = InventoryPaths::under(dir.path());
    let config = HostInventoryConfig::new("web01");
    let registry = PluginRegistry::builtin();
    let hooks = ExportHookRegistry::new();

    let result = active_inventory_for(
        &config,
        &registry,
        &StaticFactory::failing(),
        &RunOptions::default(),
    )
    .await
    .unwrap();
    let report =
        inventory_check(&paths, &config, &hooks, &result, &CheckOptions::default()).unwrap();

    assert_eq!(report.state, State::Warn);
    assert!(report.short_messages.contains(&"cannot update tree(!)".to_string()));
    assert!(report.short_messages.iter().any(|m| m.starts_with("[agent]")));
    assert!(!paths.inventory_dir.join("web01").exists());
}

#[tokio::test]
async fn test_missing_packages_message() {
    let dir = tempfile::tempdir().unwrap();
    let paths = InventoryPaths::under(dir.path());
    let config = HostInventoryConfig::new("web01");
    let registry = PluginRegistry::builtin();
    let hooks = ExportHookRegistry::new();

    // agent output without any package section
    let factory = StaticFactory {
        agent_sections: vec![sample_sections()[0].clone()],
        fail_agent: false,
    };
    let result = active_inventory_for(&config, &registry, &factory, &RunOptions::default())
        .await
        .unwrap();

    let options = CheckOptions {
        sw_missing: State::Warn,
        ..CheckOptions::default()
    };
    let report = inventory_check(&paths, &config, &hooks, &result, &options).unwrap();
    assert!(
        report
            .short_messages
            .contains(&"software packages information is missing(!)".to_string())
    );
    assert_eq!(report.state, State::Warn);
}

#[tokio::test]
async fn test_collect_many_processes_all_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(InventoryRunner {
        registry: Arc::new(PluginRegistry::builtin()),
        sources: Arc::new(StaticFactory::healthy()),
        export_hooks: Arc::new(ExportHookRegistry::new()),
        paths: InventoryPaths::under(dir.path()),
        batch_size: 2,
    });

    let configs = vec![
        HostInventoryConfig::new("web01"),
        HostInventoryConfig::new("web02"),
        HostInventoryConfig::cluster("db", vec!["db1".to_string()]),
    ];
    let outcome = runner
        .clone()
        .collect_many(configs, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.completed, 3);
    assert_eq!(outcome.failed, 0);
    assert!(runner.paths.inventory_dir.join("web01").exists());
    assert!(runner.paths.inventory_dir.join("web02").exists());
    assert!(runner.paths.inventory_dir.join("db").exists());
}
