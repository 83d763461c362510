//! Per-method coverage records.
//!
//! Reports are parsed into a flat list of [`CoverageRecord`]s, one per method
//! entry, which are then reduced to a single ratio for one metric.

pub mod aggregate;
pub mod report;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::Location;

pub use aggregate::{coverage_ratio, CoverageTotals};
pub use report::{declares_package, parse_report, parse_report_str};

/// Hit/miss counts for one metric on one method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounter {
    pub missed: u64,
    pub covered: u64,
}

impl CoverageCounter {
    pub fn new(missed: u64, covered: u64) -> Self {
        Self { missed, covered }
    }
}

/// Coverage counters for a single method found in a report.
///
/// Serializes flat as `{package, classes, method, counters}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRecord {
    #[serde(flatten)]
    pub loc: Location,
    /// Metric name (e.g. `INSTRUCTIONS`) to counter.
    pub counters: BTreeMap<String, CoverageCounter>,
}

impl CoverageRecord {
    pub fn new(loc: Location, counters: BTreeMap<String, CoverageCounter>) -> Self {
        Self { loc, counters }
    }

    /// Counter for `metric`, if the report listed one.
    pub fn counter(&self, metric: &str) -> Option<&CoverageCounter> {
        self.counters.get(metric)
    }

    /// Whether any counter of this method was hit.
    pub fn is_hit(&self) -> bool {
        self.counters.values().any(|c| c.covered > 0)
    }
}
