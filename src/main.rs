mod chart;
mod config;
mod ingest;
mod pipeline;
mod runner;

use clap::Parser;
use config::BenchConfig;
use pipeline::ChartKind;
use std::{path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "bench.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Build, run and chart the external BFS benchmark")]
struct Cli {
    /// Path to the YAML config, built-in defaults apply when the default
    /// file is absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    chart: ChartKind,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (path, is_default_location) = match cli.config {
        Some(path) => (path, false),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), true),
    };

    let config = match BenchConfig::load(&path, is_default_location) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config from {}: {e}", path.to_string_lossy());
            exit(1);
        }
    };

    if config.preflight_checks() {
        error!("Aborting due to config errors");
        exit(1);
    }

    if let Err(e) = pipeline::run(cli.chart, &config) {
        error!("{e}");
        exit(1);
    }
}
