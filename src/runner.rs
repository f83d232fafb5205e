mod local;

use crate::config::BenchConfig;
use std::{process::ExitStatus, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Compiler invocation failed to start")]
    CompilerSpawn(#[source] std::io::Error),
    #[error("Compilation failed with {status}: {stderr}")]
    BuildFailed { status: ExitStatus, stderr: String },
    #[error("Benchmark executable failed to start")]
    BenchmarkSpawn(#[source] std::io::Error),
    #[error("Benchmark ran into the {0:?} timeout and was killed")]
    Timeout(Duration),
    #[error("Failed to talk to the benchmark child proccess")]
    ChildError(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
/// container for information extracted from running the external benchmark
/// the pipeline checks `success` before any result file is touched
pub struct RunOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub runtime: Duration,
}

/// All possible runner variants
/// (this is deliberately not made with dynamic dispatch to avoid the headache)
#[derive(Debug, Clone)]
pub enum Runners {
    Local(local::LocalRunner),
}

impl Runners {
    pub fn load(config: &BenchConfig) -> Self {
        Self::Local(local::LocalRunner::load(config))
    }

    /// compile the benchmark source into its executable
    pub fn build(&self) -> Result<(), RunnerError> {
        match self {
            Self::Local(runner) => runner.build(),
        }
    }

    /// execute the compiled benchmark and collect its outcome
    pub fn run(&self) -> Result<RunOutcome, RunnerError> {
        match self {
            Self::Local(runner) => runner.run(),
        }
    }
}
