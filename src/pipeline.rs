use crate::{
    chart::{self, ChartError},
    config::BenchConfig,
    ingest::{self, Density, IngestError, Schema},
    runner::{RunnerError, Runners},
};
use clap::Subcommand;
use thiserror::Error;
use tracing::{info, instrument, trace, warn};

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Benchmark build/run failed")]
    Runner(#[from] RunnerError),
    #[error("Benchmark exited with code {code:?}: {stderr}")]
    BenchmarkFailed {
        code: Option<i32>,
        stderr: String,
    },
    #[error("Result ingestion failed")]
    Ingest(#[from] IngestError),
    #[error("Chart rendering failed")]
    Chart(#[from] ChartError),
}

#[derive(Subcommand, Clone, Copy, Debug)]
pub enum ChartKind {
    /// One chart comparing sparse and dense BFS time
    Timing,
    /// Three panels: time, static memory size and peak memory usage
    Memory,
}

impl ChartKind {
    fn schema(&self) -> Schema {
        match self {
            Self::Timing => Schema::Timing,
            Self::Memory => Schema::Memory,
        }
    }
}

/// the whole pipeline, strictly in order: build, run, ingest both result
/// tables, render the chart
///
/// every stage runs exactly once and the first failure aborts the rest
#[instrument(skip(config), level = "info")]
pub fn run(kind: ChartKind, config: &BenchConfig) -> Result<(), BenchError> {
    let runner = Runners::load(config);

    runner.build()?;
    let outcome = runner.run()?;

    if !outcome.success {
        return Err(BenchError::BenchmarkFailed {
            code: outcome.code,
            stderr: outcome.stderr,
        });
    }

    info!("Benchmark finished in {} ms", outcome.runtime.as_millis());
    trace!("Benchmark reported: {}", outcome.stdout.trim_end());

    let schema = kind.schema();
    let sparse = ingest::read_table(&config.results.sparse, Density::Sparse, schema)?;
    let dense = ingest::read_table(&config.results.dense, Density::Dense, schema)?;

    if sparse.len() != dense.len() {
        warn!(
            "Sparse table has {} rows but dense has {}, charting both as-is",
            sparse.len(),
            dense.len()
        );
    }

    match kind {
        ChartKind::Timing => chart::render_timing(&sparse, &dense, &config.chart)?,
        ChartKind::Memory => chart::render_memory(&sparse, &dense, &config.chart)?,
    }

    info!("Chart written to {}", config.chart.output.to_string_lossy());

    Ok(())
}
