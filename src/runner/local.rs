use super::{RunOutcome, RunnerError};
use crate::config::BenchConfig;
use std::{
    io::Read,
    path::{Component, Path, PathBuf},
    process::{Command, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, trace, warn};
use wait_timeout::ChildExt;

/// Runner that builds and executes the benchmark on the local machine,
/// blocking until the child exits or the timeout fires
#[derive(Debug, Clone)]
pub struct LocalRunner {
    compiler: String,
    source: PathBuf,
    output: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl LocalRunner {
    pub fn load(config: &BenchConfig) -> Self {
        Self {
            compiler: config.build.compiler.clone(),
            source: config.build.source.clone(),
            output: config.build.output.clone(),
            args: config.build.args.clone(),
            timeout: Duration::from_secs(config.run.timeout),
        }
    }

    #[instrument(skip(self), level = "info")]
    pub fn build(&self) -> Result<(), RunnerError> {
        debug!(
            "Compiling {} -> {} with {}",
            self.source.to_string_lossy(),
            self.output.to_string_lossy(),
            self.compiler
        );

        let compile = Command::new(&self.compiler)
            .arg("-o")
            .arg(&self.output)
            .arg(&self.source)
            .args(self.args.iter())
            .output()
            .map_err(RunnerError::CompilerSpawn)?;

        if !compile.status.success() {
            return Err(RunnerError::BuildFailed {
                status: compile.status,
                stderr: String::from_utf8_lossy(&compile.stderr).into_owned(),
            });
        }

        info!("Compiled {}", self.output.to_string_lossy());

        Ok(())
    }

    #[instrument(skip(self), level = "info")]
    pub fn run(&self) -> Result<RunOutcome, RunnerError> {
        let exec = invocation_path(&self.output);
        let start = Instant::now();

        let mut child = Command::new(&exec)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RunnerError::BenchmarkSpawn)?;

        debug!("Waiting on benchmark child {}", child.id());

        // drain the pipes while waiting, a child filling the pipe buffer
        // would otherwise block forever and masquerade as a timeout
        let stdout_handle = drain_pipe(child.stdout.take());
        let stderr_handle = drain_pipe(child.stderr.take());

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                // child hasn't exited yet
                child.kill()?;
                child.wait()?;

                return Err(RunnerError::Timeout(self.timeout));
            }
        };

        let runtime = start.elapsed();
        let stdout = join_pipe(stdout_handle)?;
        let stderr = join_pipe(stderr_handle)?;

        debug!(
            "Benchmark finished in {} ms | status: {}",
            runtime.as_millis(),
            status.success()
        );
        trace!("Benchmark output: {stdout}");

        Ok(RunOutcome {
            success: status.success(),
            code: status.code(),
            stdout,
            stderr,
            runtime,
        })
    }
}

fn drain_pipe<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> JoinHandle<Result<String, std::io::Error>> {
    thread::spawn(move || {
        let mut buffer = String::new();

        if let Some(mut pipe) = pipe {
            pipe.read_to_string(&mut buffer)?;
        }

        Ok(buffer)
    })
}

fn join_pipe(handle: JoinHandle<Result<String, std::io::Error>>) -> Result<String, RunnerError> {
    match handle.join() {
        Ok(content) => Ok(content?),
        Err(_) => {
            warn!("A pipe reader thread panicked, treating its output as empty");

            Ok(String::new())
        }
    }
}

/// a bare executable name would be resolved against PATH, force the working
/// directory instead to match where the compiler dropped it
fn invocation_path(output: &Path) -> PathBuf {
    if output.components().count() == 1
        && !matches!(output.components().next(), Some(Component::CurDir))
    {
        Path::new(".").join(output)
    } else {
        output.to_path_buf()
    }
}
