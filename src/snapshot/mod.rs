//! Persisting raw per-test coverage records.

use std::fs;
use std::path::PathBuf;

use crate::core::Result;
use crate::coverage::CoverageRecord;

/// Writes one snapshot file per test identifier into a results directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the snapshot for `test`.
    pub fn path_for(&self, test: &str) -> PathBuf {
        self.dir.join(test)
    }

    /// Replace the snapshot for `test` with `records`.
    pub fn write(&self, test: &str, records: &[CoverageRecord]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(test);
        let json = serde_json::to_string(records)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
