//! Reduce coverage records to a single ratio.

use serde::Serialize;

use super::CoverageRecord;
use crate::core::{Error, Result};

/// Summed counters for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageTotals {
    pub missed: u64,
    pub covered: u64,
}

impl CoverageTotals {
    /// Sum `metric` over all records.
    ///
    /// Every record must carry the metric; a missing counter means the report
    /// was generated with a different metric set, not that nothing ran.
    pub fn collect(records: &[CoverageRecord], metric: &str) -> Result<Self> {
        records.iter().try_fold(Self::default(), |acc, rec| {
            let counter = rec.counter(metric).ok_or_else(|| Error::Integrity {
                metric: metric.to_string(),
                location: rec.loc.to_string(),
            })?;
            let overflow = || Error::CounterOverflow {
                metric: metric.to_string(),
                location: rec.loc.to_string(),
            };
            Ok(Self {
                missed: acc.missed.checked_add(counter.missed).ok_or_else(overflow)?,
                covered: acc.covered.checked_add(counter.covered).ok_or_else(overflow)?,
            })
        })
    }

    /// `covered / (covered + missed)`, refusing an empty denominator.
    pub fn ratio(&self, metric: &str) -> Result<f64> {
        if self.missed == 0 && self.covered == 0 {
            return Err(Error::EmptyReport {
                metric: metric.to_string(),
            });
        }
        // Summed in f64: both totals fit in u64 but their sum may not.
        let covered = self.covered as f64;
        Ok(covered / (covered + self.missed as f64))
    }
}

/// Coverage ratio of `metric` across `records`.
pub fn coverage_ratio(records: &[CoverageRecord], metric: &str) -> Result<f64> {
    CoverageTotals::collect(records, metric)?.ratio(metric)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::core::Location;
    use crate::coverage::{parse_report_str, CoverageCounter};

    fn record(method: &str, counters: &[(&str, u64, u64)]) -> CoverageRecord {
        CoverageRecord::new(
            Location::new("org.example", "FooTest", method),
            counters
                .iter()
                .map(|(m, missed, covered)| (m.to_string(), CoverageCounter::new(*missed, *covered)))
                .collect(),
        )
    }

    #[test]
    fn test_single_record_ratio() {
        let records = vec![record("a", &[("INSTRUCTIONS", 3, 7)])];
        let ratio = coverage_ratio(&records, "INSTRUCTIONS").unwrap();
        assert!((ratio - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sums_across_records() {
        let records = vec![
            record("a", &[("INSTRUCTIONS", 3, 7), ("LINE", 1, 0)]),
            record("b", &[("INSTRUCTIONS", 10, 0), ("LINE", 0, 1)]),
        ];
        let totals = CoverageTotals::collect(&records, "INSTRUCTIONS").unwrap();
        assert_eq!(
            totals,
            CoverageTotals {
                missed: 13,
                covered: 7
            }
        );
        assert!((coverage_ratio(&records, "LINE").unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_order_independent() {
        let mut records = vec![
            record("a", &[("INSTRUCTIONS", 3, 7)]),
            record("b", &[("INSTRUCTIONS", 11, 2)]),
            record("c", &[("INSTRUCTIONS", 0, 5)]),
        ];
        let forward = coverage_ratio(&records, "INSTRUCTIONS").unwrap();
        records.reverse();
        let reversed = coverage_ratio(&records, "INSTRUCTIONS").unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_missing_metric_is_integrity_error() {
        let records = vec![
            record("a", &[("INSTRUCTIONS", 3, 7)]),
            record("b", &[("LINE", 1, 1)]),
        ];
        match coverage_ratio(&records, "INSTRUCTIONS").unwrap_err() {
            Error::Integrity { metric, location } => {
                assert_eq!(metric, "INSTRUCTIONS");
                assert_eq!(location, "org.example.FooTest#b");
            }
            other => panic!("expected Integrity, got {other:?}"),
        }
    }

    #[test]
    fn test_counter_overflow_is_reported() {
        let xml = r#"<report><package name="org.example"><class name="FooTest">
            <method name="m1"><counter type="INSTRUCTIONS" missed="18446744073709551615" covered="0"/></method>
            <method name="m2"><counter type="INSTRUCTIONS" missed="1" covered="1"/></method>
        </class></package></report>"#;
        let records = parse_report_str(xml, Path::new("jacoco.xml")).unwrap();
        match coverage_ratio(&records, "INSTRUCTIONS").unwrap_err() {
            Error::CounterOverflow { metric, location } => {
                assert_eq!(metric, "INSTRUCTIONS");
                assert_eq!(location, "org.example.FooTest#m2");
            }
            other => panic!("expected CounterOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_large_totals_still_give_ratio() {
        let totals = CoverageTotals {
            missed: u64::MAX,
            covered: u64::MAX,
        };
        let ratio = totals.ratio("INSTRUCTIONS").unwrap();
        assert!((ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_records_fail() {
        assert!(matches!(
            coverage_ratio(&[], "INSTRUCTIONS"),
            Err(Error::EmptyReport { .. })
        ));
    }

    #[test]
    fn test_all_zero_counters_fail() {
        let records = vec![
            record("a", &[("INSTRUCTIONS", 0, 0)]),
            record("b", &[("INSTRUCTIONS", 0, 0)]),
        ];
        assert!(matches!(
            coverage_ratio(&records, "INSTRUCTIONS"),
            Err(Error::EmptyReport { .. })
        ));
    }
}
