//! hostinv CLI
//!
//! Collects per-host hardware/software inventory from spooled agent
//! output and maintains the stored trees; `check` emits a monitoring
//! check result for one host.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use eyre::bail;
use tracing_subscriber::EnvFilter;

use hostinv_core::{
    CheckOptions, CheckReport, ExportHookRegistry, HostInventoryConfig, InventoryRunner,
    RunOptions, State, active_inventory_for, inventory_check,
};
use hostinv_fetch::SpoolSourceFactory;
use hostinv_plugin::PluginRegistry;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "hostinv")]
#[command(about = "Per-host hardware/software inventory collection", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect and persist inventory trees
    Collect {
        /// Hosts to inventory (default: all configured hosts)
        hosts: Vec<String>,
        /// Restrict the run to these sections; the tree is not persisted
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
        /// Run only these plugins
        #[arg(long, value_delimiter = ',')]
        plugins: Vec<String>,
        /// Propagate recoverable errors instead of recording them
        #[arg(long)]
        strict: bool,
        /// Hosts processed in parallel
        #[arg(long, default_value_t = 1)]
        batch_size: usize,
    },
    /// Run the inventory check for one host and print the result
    Check {
        host: String,
        /// State on hardware changes (0-3)
        #[arg(long, default_value_t = 0)]
        hw_changes: u8,
        /// State on software changes (0-3)
        #[arg(long, default_value_t = 0)]
        sw_changes: u8,
        /// State when software package information is missing (0-3)
        #[arg(long, default_value_t = 0)]
        sw_missing: u8,
        /// Minimum state when a data source failed (0-3)
        #[arg(long, default_value_t = 1)]
        inv_fail_status: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    match cli.command {
        Commands::Collect {
            hosts,
            sections,
            plugins,
            strict,
            batch_size,
        } => {
            let configs = select_hosts(&config, &hosts)?;
            let options = RunOptions {
                selected_sections: to_selection(sections),
                run_only_plugins: to_selection(plugins),
                strict,
            };

            let runner = Arc::new(InventoryRunner {
                registry: Arc::new(PluginRegistry::builtin()),
                sources: Arc::new(SpoolSourceFactory::new(
                    config.storage.spool_dir(),
                    config.storage.max_spool_age_secs,
                )),
                export_hooks: Arc::new(ExportHookRegistry::new()),
                paths: config.storage.paths(),
                batch_size,
            });

            let outcome = runner.collect_many(configs, options).await?;
            println!(
                "{} hosts: {} completed, {} failed",
                outcome.total, outcome.completed, outcome.failed
            );
            if outcome.failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Check {
            host,
            hw_changes,
            sw_changes,
            sw_missing,
            inv_fail_status,
        } => {
            let Some(host_config) = config.host(&host).cloned() else {
                bail!("host not configured: {host}");
            };
            let options = CheckOptions {
                hw_changes: State::from_int(hw_changes),
                sw_changes: State::from_int(sw_changes),
                sw_missing: State::from_int(sw_missing),
                fail_status: State::from_int(inv_fail_status),
            };

            let report = run_check(&config, &host_config, &options).await?;
            print_report(&report);
            std::process::exit(report.state.as_int().into());
        }
    }

    Ok(())
}

/// Resolve the requested hosts, or all configured ones when none given
fn select_hosts(config: &Config, requested: &[String]) -> Result<Vec<HostInventoryConfig>> {
    if requested.is_empty() {
        return Ok(config.host.clone());
    }
    requested
        .iter()
        .map(|name| {
            config
                .host(name)
                .cloned()
                .ok_or_else(|| eyre::eyre!("host not configured: {name}"))
        })
        .collect()
}

fn to_selection(values: Vec<String>) -> Option<BTreeSet<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.into_iter().collect())
    }
}

async fn run_check(
    config: &Config,
    host_config: &HostInventoryConfig,
    options: &CheckOptions,
) -> Result<CheckReport> {
    let registry = PluginRegistry::builtin();
    let sources = SpoolSourceFactory::new(
        config.storage.spool_dir(),
        config.storage.max_spool_age_secs,
    );
    let hooks = ExportHookRegistry::new();

    let result =
        active_inventory_for(host_config, &registry, &sources, &RunOptions::default()).await?;
    let report = inventory_check(
        &config.storage.paths(),
        host_config,
        &hooks,
        &result,
        options,
    )?;
    Ok(report)
}

/// Print a check result in the usual single-line format
fn print_report(report: &CheckReport) {
    let mut line = format!("{} - {}", report.state, report.short_messages.join(", "));
    if !report.metrics.is_empty() {
        let perfdata: Vec<String> = report
            .metrics
            .iter()
            .map(|m| format!("{}={}", m.name, m.value))
            .collect();
        line.push_str(" | ");
        line.push_str(&perfdata.join(" "));
    }
    println!("{line}");
    for message in &report.long_messages {
        println!("{message}");
    }
}
