//! Coverage collection for one test identifier.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::{Location, Result};
use crate::coverage::{parse_report, CoverageRecord, CoverageTotals};
use crate::resolve::{ReportSelector, SourceResolver};
use crate::snapshot::SnapshotWriter;

/// Coverage of one test identifier.
#[derive(Debug, Clone)]
pub struct Collected {
    pub location: Location,
    pub source: PathBuf,
    pub report: PathBuf,
    pub records: Vec<CoverageRecord>,
    pub totals: CoverageTotals,
    pub ratio: f64,
    pub snapshot: Option<PathBuf>,
}

impl Collected {
    /// Number of methods with at least one covered counter.
    pub fn hit_methods(&self) -> usize {
        self.records.iter().filter(|r| r.is_hit()).count()
    }
}

/// Resolves, parses, aggregates and snapshots coverage per identifier.
///
/// Expects the report on disk to belong to the identifier being collected;
/// callers must not run another test between running and collecting.
#[derive(Debug)]
pub struct CoverageCollector {
    resolver: SourceResolver,
    selector: ReportSelector,
    metric: String,
    snapshots: Option<SnapshotWriter>,
}

impl CoverageCollector {
    pub fn new(resolver: SourceResolver, selector: ReportSelector, metric: impl Into<String>) -> Self {
        Self {
            resolver,
            selector,
            metric: metric.into(),
            snapshots: None,
        }
    }

    /// Write a snapshot of the raw records after each successful collection.
    pub fn with_snapshots(mut self, writer: SnapshotWriter) -> Self {
        self.snapshots = Some(writer);
        self
    }

    /// Build a collector for the project at `root`.
    pub fn from_config(root: &Path, config: &Config, candidates: Vec<String>) -> Result<Self> {
        let resolver = SourceResolver::new(root, &config.source_extension)
            .with_exclude(&config.exclude_patterns)?;
        let selector = ReportSelector::new(root, &config.report_file, candidates);
        let collector = Self::new(resolver, selector, &config.metric);
        Ok(if config.snapshots {
            collector.with_snapshots(SnapshotWriter::new(root.join(&config.results_dir)))
        } else {
            collector
        })
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Report path for `loc`: resolve its source, then select a build unit.
    pub fn locate(&mut self, loc: &Location) -> Result<(PathBuf, PathBuf)> {
        let source = self.resolver.resolve(loc)?;
        tracing::debug!("{} defined in {}", loc.qualified_class(), source.display());
        let report = self.selector.select(loc, &source)?;
        Ok((source, report))
    }

    /// Collect coverage for a raw identifier.
    pub fn collect(&mut self, test: &str) -> Result<Collected> {
        let location = Location::parse(test)?;
        self.collect_location(test, location)
    }

    /// Collect coverage for an already parsed identifier.
    pub fn collect_location(&mut self, test: &str, location: Location) -> Result<Collected> {
        let (source, report) = self.locate(&location)?;
        tracing::debug!("using report {}", report.display());

        let records = parse_report(&report)?;
        if let Some(sample) = records.first() {
            tracing::debug!("cov_record sample: {:?}", sample);
        }

        let totals = CoverageTotals::collect(&records, &self.metric)?;
        let ratio = totals.ratio(&self.metric)?;
        tracing::info!("{} coverage rate: {:.2}", self.metric, ratio);

        let snapshot = match &self.snapshots {
            Some(writer) => Some(writer.write(test, &records)?),
            None => None,
        };

        Ok(Collected {
            location,
            source,
            report,
            records,
            totals,
            ratio,
            snapshot,
        })
    }
}
