use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

use grid_optimizer::{
    Config, DEFAULT_CONFIG_PATH, DiscretizationReport, Instance, SearchStrategy, TieBreak,
    optimize,
};

#[derive(Parser)]
#[command(author, version, about = "Select a minimal set of grid lines for an object layout", long_about = None)]
struct Args {
    /// Instance file (TOML: maxx, maxy, h_lines, v_lines, [[footprints]])
    #[arg(short, long)]
    instance: PathBuf,

    /// Configuration file path (defaults to config/default.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the search strategy
    #[arg(long)]
    strategy: Option<SearchStrategy>,

    /// Override the tie-break policy
    #[arg(long)]
    tie_break: Option<TieBreak>,

    /// Override the wall-clock budget in milliseconds
    #[arg(long)]
    time_budget_ms: Option<u64>,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let path = match path {
        Some(path) => path,
        None if default_path.exists() => default_path,
        None => return Ok(Config::default()),
    };
    let config = Config::load_from_file(path)?;
    info!("Loaded configuration: {}", path.display());
    Ok(config)
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config.optimizer.strategy = strategy;
    }
    if let Some(tie_break) = args.tie_break {
        config.optimizer.tie_break = tie_break;
    }
    if let Some(budget) = args.time_budget_ms {
        config.optimizer.time_budget_ms = Some(budget);
    }

    let instance = Instance::load_from_file(&args.instance)
        .with_context(|| format!("failed to load instance '{}'", args.instance.display()))?;
    info!(
        "Instance: {}x{} surface, {} H / {} V candidates, {} footprints",
        instance.maxx(),
        instance.maxy(),
        instance.h_lines().len(),
        instance.v_lines().len(),
        instance.footprints().len()
    );

    let result = optimize(&instance, &config.optimizer)?;
    let report = DiscretizationReport::new(&instance, &result);
    report.log();

    println!("{}", report);
    println!();
    print!("{}", toml::to_string(&result.selection)?);

    Ok(())
}
