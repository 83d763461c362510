//! Sequential batch processing of test identifiers.
//!
//! Each identifier is run (optionally) and collected before the next one
//! starts. Per-identifier failures are recorded and the batch moves on; only
//! a runner that cannot execute at all aborts the batch.

mod collector;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{Error, ErrorKind, Location, ProgressTracker, Result};
use crate::runner::TestRunner;

pub use collector::{Collected, CoverageCollector};

/// Batch driver options.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Stop after the first failed identifier.
    pub fail_fast: bool,
    /// Process at most this many identifiers.
    pub limit: Option<usize>,
    /// Show a progress bar on stderr.
    pub progress: bool,
}

/// Whether an identifier produced a coverage ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// Result for one test identifier.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    /// 1-based position in the input list.
    pub index: usize,
    pub test: String,
    pub status: OutcomeStatus,
    /// Test tool status, when the tool was run.
    pub run: Option<String>,
    pub ratio: Option<f64>,
    pub covered: Option<u64>,
    pub missed: Option<u64>,
    pub methods: Option<usize>,
    pub hit_methods: Option<usize>,
    pub report: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
}

impl TestOutcome {
    fn empty(index: usize, test: &str) -> Self {
        Self {
            index,
            test: test.to_string(),
            status: OutcomeStatus::Failed,
            run: None,
            ratio: None,
            covered: None,
            missed: None,
            methods: None,
            hit_methods: None,
            report: None,
            error_kind: None,
            error: None,
        }
    }

    fn succeeded(mut self, collected: &Collected) -> Self {
        self.status = OutcomeStatus::Succeeded;
        self.ratio = Some(collected.ratio);
        self.covered = Some(collected.totals.covered);
        self.missed = Some(collected.totals.missed);
        self.methods = Some(collected.records.len());
        self.hit_methods = Some(collected.hit_methods());
        self.report = Some(collected.report.display().to_string());
        self
    }

    fn failed(mut self, err: &Error) -> Self {
        self.status = OutcomeStatus::Failed;
        self.error_kind = Some(err.kind());
        self.error = Some(err.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

/// Summary of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub metric: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Identifiers in the input list.
    pub total: usize,
    /// Identifiers actually processed.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when `fail_fast` stopped the batch.
    pub stopped_early: bool,
    pub outcomes: Vec<TestOutcome>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && !self.stopped_early
    }
}

/// Drives identifiers through the runner and the collector one at a time.
pub struct BatchDriver {
    collector: CoverageCollector,
    runner: Option<Box<dyn TestRunner>>,
    options: BatchOptions,
}

impl BatchDriver {
    /// Driver that only collects existing reports.
    pub fn new(collector: CoverageCollector, options: BatchOptions) -> Self {
        Self {
            collector,
            runner: None,
            options,
        }
    }

    /// Run the test tool before collecting each identifier.
    pub fn with_runner(mut self, runner: Box<dyn TestRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Process `tests` in order.
    pub fn run(&mut self, tests: &[String]) -> Result<BatchReport> {
        let started_at = Utc::now();
        let selected = self.options.limit.unwrap_or(tests.len()).min(tests.len());
        let progress = ProgressTracker::for_batch(selected, self.options.progress);

        let mut outcomes = Vec::with_capacity(selected);
        let mut stopped_early = false;

        for (i, test) in tests.iter().take(selected).enumerate() {
            let index = i + 1;
            tracing::info!("running testmethod {}: {}", index, test);
            progress.set_message(test.clone());

            let outcome = self.process(index, test)?;
            progress.inc();

            let failed = !outcome.is_success();
            if failed {
                tracing::warn!(
                    "running {} failed: {}",
                    index,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            outcomes.push(outcome);

            if failed && self.options.fail_fast {
                stopped_early = index < selected;
                break;
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let attempted = outcomes.len();
        progress.finish("done");
        tracing::info!("{} cases succeed among {} tries.", succeeded, attempted);

        Ok(BatchReport {
            metric: self.collector.metric().to_string(),
            started_at,
            finished_at: Utc::now(),
            total: tests.len(),
            attempted,
            succeeded,
            failed: attempted - succeeded,
            stopped_early,
            outcomes,
        })
    }

    /// Run and collect one identifier. Only run-fatal errors are returned.
    fn process(&mut self, index: usize, test: &str) -> Result<TestOutcome> {
        let mut outcome = TestOutcome::empty(index, test);

        let location = match Location::parse(test) {
            Ok(location) => location,
            Err(e) => return Ok(outcome.failed(&e)),
        };

        if let Some(runner) = &self.runner {
            let status = runner.run(test)?;
            outcome.run = Some(status.to_string());
        }

        Ok(match self.collector.collect_location(test, location) {
            Ok(collected) => outcome.succeeded(&collected),
            Err(e) => outcome.failed(&e),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;

    use super::*;
    use crate::resolve::{ReportSelector, SourceResolver};
    use crate::runner::RunStatus;

    const REPORT_FILE: &str = "target/site/jacoco/jacoco.xml";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "web/src/org/example/FooTest.java", "");
        write(
            temp.path(),
            &format!("web/{REPORT_FILE}"),
            r#"<report><package name="org.example"><class name="Foo">
                <method name="a"><counter type="INSTRUCTIONS" missed="1" covered="3"/></method>
            </class></package></report>"#,
        );
        temp
    }

    fn driver(root: &Path, options: BatchOptions) -> BatchDriver {
        let collector = CoverageCollector::new(
            SourceResolver::new(root, "java"),
            ReportSelector::new(root, REPORT_FILE, vec!["web".to_string()]),
            "INSTRUCTIONS",
        );
        BatchDriver::new(collector, options)
    }

    fn tests(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    struct RecordingRunner {
        calls: Rc<RefCell<Vec<String>>>,
        status: RunStatus,
    }

    impl TestRunner for RecordingRunner {
        fn run(&self, test: &str) -> Result<RunStatus> {
            self.calls.borrow_mut().push(test.to_string());
            Ok(self.status)
        }
    }

    struct BrokenRunner;

    impl TestRunner for BrokenRunner {
        fn run(&self, _test: &str) -> Result<RunStatus> {
            Err(Error::runner("mvn: command not found"))
        }
    }

    #[test]
    fn test_failures_do_not_stop_batch() {
        let temp = project();
        let report = driver(temp.path(), BatchOptions::default())
            .run(&tests(&[
                "org.example.FooTest#a",
                "not-an-identifier",
                "org.example.MissingTest#a",
                "org.example.FooTest#b",
            ]))
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.attempted, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 2);
        assert!(!report.all_succeeded());

        assert_eq!(report.outcomes[0].ratio, Some(0.75));
        assert_eq!(report.outcomes[0].hit_methods, Some(1));
        assert_eq!(report.outcomes[1].error_kind, Some(ErrorKind::Parse));
        assert_eq!(report.outcomes[2].error_kind, Some(ErrorKind::Resolution));
        assert_eq!(report.outcomes[3].index, 4);
    }

    #[test]
    fn test_fail_fast_stops_batch() {
        let temp = project();
        let options = BatchOptions {
            fail_fast: true,
            ..Default::default()
        };
        let report = driver(temp.path(), options)
            .run(&tests(&["org.example.MissingTest#a", "org.example.FooTest#a"]))
            .unwrap();

        assert_eq!(report.attempted, 1);
        assert!(report.stopped_early);
    }

    #[test]
    fn test_limit() {
        let temp = project();
        let options = BatchOptions {
            limit: Some(1),
            ..Default::default()
        };
        let report = driver(temp.path(), options)
            .run(&tests(&["org.example.FooTest#a", "org.example.FooTest#b"]))
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.attempted, 1);
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_runner_called_only_for_valid_identifiers() {
        let temp = project();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = RecordingRunner {
            calls: Rc::clone(&calls),
            status: RunStatus::Failed { code: Some(1) },
        };

        let report = driver(temp.path(), BatchOptions::default())
            .with_runner(Box::new(runner))
            .run(&tests(&["bad id", "org.example.FooTest#a"]))
            .unwrap();

        assert_eq!(*calls.borrow(), vec!["org.example.FooTest#a".to_string()]);
        assert!(report.outcomes[0].run.is_none());
        // A failed tool run still collects whatever report is on disk.
        assert_eq!(report.outcomes[1].run.as_deref(), Some("failed (exit 1)"));
        assert!(report.outcomes[1].is_success());
    }

    #[test]
    fn test_broken_runner_aborts_batch() {
        let temp = project();
        let err = driver(temp.path(), BatchOptions::default())
            .with_runner(Box::new(BrokenRunner))
            .run(&tests(&["org.example.FooTest#a"]))
            .unwrap_err();
        assert!(err.is_run_fatal());
    }

    #[test]
    fn test_report_serializes() {
        let temp = project();
        let report = driver(temp.path(), BatchOptions::default())
            .run(&tests(&["org.example.FooTest#a"]))
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metric"], "INSTRUCTIONS");
        assert_eq!(json["outcomes"][0]["status"], "succeeded");
        assert!(json["started_at"].is_string());
    }
}
