//! utcov - Per-test coverage collection for multi-module builds.
//!
//! For each test identifier (`<package>.<Class>#<method>`), utcov locates the
//! test class source, picks the build unit whose coverage report belongs to
//! it, parses the JaCoCo-style XML report and reduces one counter type to a
//! covered/total ratio. The raw per-method records are snapshotted per test.
//!
//! # Example
//!
//! ```no_run
//! use utcov::batch::CoverageCollector;
//! use utcov::config::Config;
//! use std::path::Path;
//!
//! let config = Config::default();
//! let mut collector =
//!     CoverageCollector::from_config(Path::new("."), &config, vec!["./web".to_string()])
//!         .unwrap();
//! let collected = collector.collect("org.example.FooTest#bar").unwrap();
//! println!("{} coverage: {:.2}", config.metric, collected.ratio);
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod core;
pub mod coverage;
pub mod inputs;
pub mod output;
pub mod resolve;
pub mod runner;
pub mod snapshot;

pub use batch::{BatchDriver, BatchReport, CoverageCollector};
pub use core::{Error, Location, Result};
