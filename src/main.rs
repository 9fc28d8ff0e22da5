use mapf_cuts::config::{Cli, Config};
use mapf_cuts::master::RelaxedMaster;
use mapf_cuts::separator::{SepaResult, SeparationEngine};
use mapf_cuts::snapshot::Snapshot;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if cli.config.is_none() {
        info!("No config file specified, using default config");
    }

    let snapshot_path = config
        .snapshot_path
        .clone()
        .ok_or_else(|| anyhow!("no snapshot given, use --snapshot or snapshot_path"))?;
    let mut master: RelaxedMaster = Snapshot::load_from_file(&snapshot_path)?
        .into_master()
        .with_context(|| format!("invalid snapshot: {snapshot_path}"))?;

    let mut engine = SeparationEngine::new(config);
    match engine.separate(&mut master)? {
        SepaResult::Separated(handles) => {
            for handle in handles {
                if let Some(cut) = master.pool().get(handle) {
                    info!("{handle:?}: {cut}");
                }
            }
        }
        SepaResult::DidNotFind => info!("no violated cuts"),
    }
    engine.stats().print();

    Ok(())
}
