//! Error types for the utcov library.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using utcov's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while collecting per-test coverage.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An input list could not be used.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Test identifier does not have the `<package>.<Class>#<method>` shape.
    #[error("Cannot parse test identifier '{input}': {reason}")]
    Parse { input: String, reason: String },

    /// The test class source file was not found under the search root.
    #[error("Source file {file} for package {package} not found under {root}")]
    Resolution {
        package: String,
        file: String,
        root: PathBuf,
    },

    /// No candidate directory contains the source and a report for its package.
    #[error("No build unit with a report for package {package} contains {source_path}")]
    Selection {
        package: String,
        source_path: PathBuf,
    },

    /// Several candidates qualify with the same path length.
    #[error("Ambiguous build unit for package {package}: {candidates:?}")]
    AmbiguousSelection {
        package: String,
        candidates: Vec<String>,
    },

    /// The report does not follow the package/class/method/counter nesting.
    #[error("Malformed coverage report {path}: {message}")]
    Structural { path: PathBuf, message: String },

    /// A record does not carry the requested metric.
    #[error("Metric {metric} missing for {location}")]
    Integrity { metric: String, location: String },

    /// Summed counters no longer fit in a `u64`.
    #[error("{metric} counters overflow when summed at {location}")]
    CounterOverflow { metric: String, location: String },

    /// Nothing to compute a ratio from.
    #[error("No {metric} counters to aggregate")]
    EmptyReport { metric: String },

    /// The external test tool could not be executed at all.
    #[error("Test runner error: {0}")]
    Runner(String),
}

/// Classification of an error, recorded per test identifier in batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Io,
    Config,
    InvalidInput,
    Parse,
    Resolution,
    Selection,
    Structural,
    Integrity,
    EmptyReport,
    Runner,
}

impl Error {
    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new structural error for the report at `path`.
    pub fn structural(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Structural {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new runner error.
    pub fn runner(message: impl Into<String>) -> Self {
        Self::Runner(message.into())
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Config(_) => ErrorKind::Config,
            Self::Serialization(_) | Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Resolution { .. } => ErrorKind::Resolution,
            Self::Selection { .. } | Self::AmbiguousSelection { .. } => ErrorKind::Selection,
            Self::Structural { .. } => ErrorKind::Structural,
            Self::Integrity { .. } | Self::CounterOverflow { .. } => ErrorKind::Integrity,
            Self::EmptyReport { .. } => ErrorKind::EmptyReport,
            Self::Runner(_) => ErrorKind::Runner,
        }
    }

    /// Whether this error must abort a whole batch rather than one identifier.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::Runner(_))
    }
}
