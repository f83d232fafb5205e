use serde::{Deserialize, Serialize};
use std::{fs::File, path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Config file not found at {0:?}")]
    FileNotFound(PathBuf),
    #[error("Failed to read config file")]
    FileUnreadable(#[from] std::io::Error),
    #[error("Failed to parse config file")]
    ParseFailed(#[from] serde_yaml::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    // how to produce the benchmark executable from its source file
    #[serde(default)]
    pub build: BuildConfig,
    // how to execute the produced benchmark binary
    #[serde(default)]
    pub run: RunConfig,
    // where the benchmark drops its CSV result files
    #[serde(default)]
    pub results: ResultsConfig,
    // chart artifact settings
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default = "default_compiler")]
    pub compiler: String,
    #[serde(default = "default_source")]
    pub source: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    // extra compiler flags, appended verbatim
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    // seconds before the benchmark child is killed
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct ResultsConfig {
    #[serde(default = "default_sparse_results")]
    pub sparse: PathBuf,
    #[serde(default = "default_dense_results")]
    pub dense: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    #[serde(default = "default_chart_output")]
    pub output: PathBuf,
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl BenchConfig {
    /// load the config from a YAML file
    ///
    /// a missing file at the default location falls back to the built-in
    /// defaults, a missing file anywhere else is an error
    pub fn load(path: &PathBuf, is_default_location: bool) -> Result<Self, ConfigErrors> {
        if !path.is_file() {
            if is_default_location {
                info!(
                    "No config found at {}, using built-in defaults",
                    path.to_string_lossy()
                );

                return Ok(Self::default());
            }

            return Err(ConfigErrors::FileNotFound(path.clone()));
        }

        Ok(serde_yaml::from_reader(File::open(path)?)?)
    }

    /// attempt to catch all config errors instead of piece-by-piece to make
    /// debugging easier for users
    pub fn preflight_checks(&self) -> bool {
        let mut contains_error = false;

        if !self.build.source.is_file() {
            error!(
                "build.source not found at {}, nothing to compile",
                self.build.source.to_string_lossy()
            );
            contains_error = true;
        }

        if self.build.compiler.is_empty() {
            error!("build.compiler cannot be empty");
            contains_error = true;
        }

        if self.run.timeout == 0 {
            error!("run.timeout cannot be 0. This will kill the benchmark before it starts.");
            contains_error = true;
        }

        if self.results.sparse == self.results.dense {
            warn!(
                "results.sparse and results.dense point at the same file, both tables will be identical"
            );
        }

        for (name, path) in [
            ("results.sparse", &self.results.sparse),
            ("results.dense", &self.results.dense),
        ] {
            if path.as_os_str().is_empty() {
                error!("{name} cannot be an empty path");
                contains_error = true;
            }
        }

        if self.chart.width == 0 || self.chart.height == 0 {
            error!("chart.width and chart.height must be non-zero");
            contains_error = true;
        }

        contains_error
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            run: RunConfig::default(),
            results: ResultsConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            source: default_source(),
            output: default_output(),
            args: Vec::new(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            sparse: default_sparse_results(),
            dense: default_dense_results(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output: default_chart_output(),
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

fn default_compiler() -> String {
    String::from("g++")
}

fn default_source() -> PathBuf {
    PathBuf::from_str("main.cpp").unwrap()
}

fn default_output() -> PathBuf {
    PathBuf::from_str("bfs_test").unwrap()
}

fn default_timeout() -> u64 {
    300
}

fn default_sparse_results() -> PathBuf {
    PathBuf::from_str("sparse_bfs_results.csv").unwrap()
}

fn default_dense_results() -> PathBuf {
    PathBuf::from_str("dense_bfs_results.csv").unwrap()
}

fn default_chart_output() -> PathBuf {
    PathBuf::from_str("bfs_performance.svg").unwrap()
}

fn default_chart_width() -> u32 {
    1280
}

fn default_chart_height() -> u32 {
    720
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: BenchConfig = serde_yaml::from_str(
            "build:\n  compiler: clang++\nrun:\n  timeout: 10\n",
        )
        .unwrap();

        assert_eq!(config.build.compiler, "clang++");
        assert_eq!(config.build.source, PathBuf::from("main.cpp"));
        assert_eq!(config.build.output, PathBuf::from("bfs_test"));
        assert_eq!(config.run.timeout, 10);
        assert_eq!(
            config.results.sparse,
            PathBuf::from("sparse_bfs_results.csv")
        );
        assert_eq!(config.chart.output, PathBuf::from("bfs_performance.svg"));
    }

    #[test]
    fn empty_sections_use_defaults() {
        let config: BenchConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.build.compiler, "g++");
        assert_eq!(config.run.timeout, 300);
        assert_eq!(config.results.dense, PathBuf::from("dense_bfs_results.csv"));
        assert_eq!(config.chart.width, 1280);
        assert_eq!(config.chart.height, 720);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<BenchConfig, _> =
            serde_yaml::from_str("build:\n  comiler: g++\n");

        assert!(result.is_err());
    }
}
