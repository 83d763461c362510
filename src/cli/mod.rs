//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::batch::BatchOptions;
use crate::config::Config;

/// utcov - Per-test coverage collection for multi-module builds.
#[derive(Parser)]
#[command(name = "utcov")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root containing the build units
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run each test and collect its coverage
    Run(RunArgs),

    /// Collect coverage from reports already on disk
    #[command(alias = "c")]
    Collect(CollectArgs),

    /// List build units containing a marker directory
    Discover(DiscoverArgs),

    /// Print the default configuration file
    Config,
}

/// Options shared by commands that collect coverage.
#[derive(Args)]
pub struct CollectOptions {
    /// JSON list of candidate build-unit directories
    #[arg(long)]
    pub report_dirs: Option<PathBuf>,

    /// Metric aggregated into the ratio (e.g. INSTRUCTIONS, LINE, BRANCH)
    #[arg(short, long)]
    pub metric: Option<String>,

    /// Snapshot directory
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Do not write per-test snapshots
    #[arg(long)]
    pub no_snapshot: bool,

    /// Exit with failure when any test fails to produce a ratio
    #[arg(long)]
    pub strict: bool,
}

impl CollectOptions {
    /// Override config values with the flags that were given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.report_dirs {
            config.inputs.report_dirs = path.clone();
        }
        if let Some(metric) = &self.metric {
            config.metric = metric.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
        if self.no_snapshot {
            config.snapshots = false;
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CollectOptions,

    /// JSON list of test identifiers
    #[arg(long)]
    pub tests: Option<PathBuf>,

    /// Collect only; assume the tests were already run
    #[arg(long)]
    pub no_run: bool,

    /// Stop at the first failed test
    #[arg(long)]
    pub fail_fast: bool,

    /// Process at most N tests
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Stream the test tool's output
    #[arg(long)]
    pub show_output: bool,

    /// Kill the test tool after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

impl RunArgs {
    /// Override config values with the flags that were given.
    pub fn apply(&self, config: &mut Config) {
        self.common.apply(config);
        if let Some(path) = &self.tests {
            config.inputs.test_methods = path.clone();
        }
        if self.fail_fast {
            config.batch.fail_fast = true;
        }
        if self.limit.is_some() {
            config.batch.limit = self.limit;
        }
        if self.show_output {
            config.runner.show_output = true;
        }
        if self.timeout.is_some() {
            config.runner.timeout_secs = self.timeout;
        }
    }

    /// Batch options after config and flags are merged.
    pub fn batch_options(&self, config: &Config) -> BatchOptions {
        BatchOptions {
            fail_fast: config.batch.fail_fast,
            limit: config.batch.limit,
            progress: self.progress,
        }
    }
}

#[derive(Args)]
pub struct CollectArgs {
    #[command(flatten)]
    pub common: CollectOptions,

    /// Test identifiers (<package>.<Class>#<method>)
    #[arg(required = true)]
    pub tests: Vec<String>,
}

#[derive(Args)]
pub struct DiscoverArgs {
    /// Sub-path marking a build unit (default from config)
    #[arg(short, long)]
    pub marker: Option<String>,

    /// Also write the list as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}
