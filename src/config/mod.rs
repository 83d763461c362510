//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Report location relative to a build unit directory.
    pub report_file: PathBuf,
    /// Metric aggregated into the coverage ratio.
    pub metric: String,
    /// Extension of test class source files.
    pub source_extension: String,
    /// Directory receiving per-test snapshots, relative to the project root.
    pub results_dir: PathBuf,
    /// Write per-test snapshots.
    pub snapshots: bool,
    /// Glob patterns skipped while searching for test sources.
    #[serde(rename = "exclude")]
    pub exclude_patterns: Vec<String>,
    /// Input list locations.
    pub inputs: InputsConfig,
    /// External test runner.
    pub runner: RunnerConfig,
    /// Batch driver behavior.
    pub batch: BatchConfig,
    /// Build unit discovery.
    pub discover: DiscoverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_file: PathBuf::from("target/site/jacoco/jacoco.xml"),
            metric: "INSTRUCTIONS".to_string(),
            source_extension: "java".to_string(),
            results_dir: PathBuf::from("ut_cov_data"),
            snapshots: true,
            exclude_patterns: Vec::new(),
            inputs: InputsConfig::default(),
            runner: RunnerConfig::default(),
            batch: BatchConfig::default(),
            discover: DiscoverConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Env vars with `UTCOV_` prefix
    /// override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("UTCOV_").split("__"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory, looking for utcov.toml or
    /// .utcov/utcov.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("utcov.toml")))
            .merge(Toml::file(dir.join(".utcov/utcov.toml")))
            .merge(Env::prefixed("UTCOV_").split("__"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no collection could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.metric.trim().is_empty() {
            return Err(Error::config("metric must not be empty"));
        }
        if self.report_file.as_os_str().is_empty() {
            return Err(Error::config("report_file must not be empty"));
        }
        Ok(())
    }

    /// Reject a runner command that cannot target a single test.
    pub fn validate_runner(&self) -> Result<()> {
        if !self.runner.command.contains("{test}") {
            return Err(Error::config(
                "runner.command must contain the {test} placeholder",
            ));
        }
        Ok(())
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Input list locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// JSON list of test identifiers.
    pub test_methods: PathBuf,
    /// JSON list of candidate build-unit directories.
    pub report_dirs: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            test_methods: PathBuf::from("data/test_methods.json"),
            report_dirs: PathBuf::from("data/report_dir.json"),
        }
    }
}

/// External test runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Shell command; `{test}` is replaced by the test identifier.
    pub command: String,
    /// Kill the command after this many seconds.
    pub timeout_secs: Option<u64>,
    /// File receiving the output of a failed run.
    pub error_log: PathBuf,
    /// Stream the tool's output instead of capturing it.
    pub show_output: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "mvn clean test jacoco:report -Drat.skip=true \
                      -Dsurefire.failIfNoSpecifiedTests=false -Djacoco.skip=false \
                      -Dtest='{test}'"
                .to_string(),
            timeout_secs: None,
            error_log: PathBuf::from("data/cmd_err.log"),
            show_output: false,
        }
    }
}

/// Batch driver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Stop at the first identifier that fails.
    pub fail_fast: bool,
    /// Process at most this many identifiers.
    pub limit: Option<usize>,
}

/// Build unit discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverConfig {
    /// Sub-path whose presence marks a build unit.
    pub marker: String,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            marker: "target/surefire-reports".to_string(),
        }
    }
}
