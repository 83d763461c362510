//! Choosing the build unit whose report covers a test.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::core::{Error, Location, Result};
use crate::coverage::declares_package;

/// Picks one candidate build unit for a resolved test source.
///
/// A candidate qualifies when it contains the source file and its report
/// declares the test's package. Among qualifying candidates the longest path
/// string wins, which favors the most deeply nested build unit.
#[derive(Debug, Clone)]
pub struct ReportSelector {
    root: PathBuf,
    report_file: PathBuf,
    candidates: Vec<String>,
}

impl ReportSelector {
    /// Relative candidates are taken relative to `root`. Duplicates are dropped.
    pub fn new(
        root: impl Into<PathBuf>,
        report_file: impl Into<PathBuf>,
        candidates: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for candidate in candidates {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        Self {
            root: root.into(),
            report_file: report_file.into(),
            candidates: unique,
        }
    }

    /// Directory of a candidate build unit.
    pub fn unit_dir(&self, candidate: &str) -> PathBuf {
        self.root.join(candidate)
    }

    /// Report location inside a candidate build unit.
    pub fn report_path(&self, candidate: &str) -> PathBuf {
        self.unit_dir(candidate).join(&self.report_file)
    }

    /// Select the report for `loc`, whose class source lives at `source_path`.
    ///
    /// Candidates tied on path length are reported as
    /// [`Error::AmbiguousSelection`] rather than broken arbitrarily.
    pub fn select(&self, loc: &Location, source_path: &Path) -> Result<PathBuf> {
        let mut best: Vec<&str> = Vec::new();

        for candidate in &self.candidates {
            if !source_path.starts_with(self.unit_dir(candidate)) {
                continue;
            }

            let report = self.report_path(candidate);
            if !declares_package(&report, &loc.package)? {
                tracing::debug!(
                    "{} contains {} but has no report for {}",
                    candidate,
                    source_path.display(),
                    loc.package
                );
                continue;
            }

            let longest = best.first().map_or(0, |b| b.len());
            match candidate.len().cmp(&longest) {
                Ordering::Greater => best = vec![candidate.as_str()],
                Ordering::Equal => best.push(candidate),
                Ordering::Less => {}
            }
        }

        match best.as_slice() {
            [] => Err(Error::Selection {
                package: loc.package.clone(),
                source_path: source_path.to_path_buf(),
            }),
            [selected] => Ok(self.report_path(selected)),
            tied => Err(Error::AmbiguousSelection {
                package: loc.package.clone(),
                candidates: tied.iter().map(|c| c.to_string()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const REPORT_FILE: &str = "target/site/jacoco/jacoco.xml";

    fn write_report(root: &Path, unit: &str, packages: &[&str]) {
        let path = root.join(unit).join(REPORT_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let body: String = packages
            .iter()
            .map(|p| format!(r#"<package name="{p}"/>"#))
            .collect();
        fs::write(path, format!("<report>{body}</report>")).unwrap();
    }

    fn selector(root: &Path, candidates: &[&str]) -> ReportSelector {
        ReportSelector::new(
            root,
            REPORT_FILE,
            candidates.iter().map(|c| c.to_string()),
        )
    }

    fn loc() -> Location {
        Location::new("org.example", "FooTest", "bar")
    }

    #[test]
    fn test_selects_unit_with_valid_report() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_report(root, "mod-a", &["org.example"]);
        write_report(root, "mod-a/sub", &["org.other"]);

        let source = root.join("mod-a/sub/src/test/java/org/example/FooTest.java");
        let selected = selector(root, &["mod-a", "mod-a/sub"])
            .select(&loc(), &source)
            .unwrap();
        assert_eq!(selected, root.join("mod-a").join(REPORT_FILE));
    }

    #[test]
    fn test_longest_qualifying_candidate_wins() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_report(root, "mod-a", &["org.example"]);
        write_report(root, "mod-a/sub", &["org.example"]);

        let source = root.join("mod-a/sub/src/org/example/FooTest.java");
        let selected = selector(root, &["mod-a/sub", "mod-a"])
            .select(&loc(), &source)
            .unwrap();
        assert_eq!(selected, root.join("mod-a/sub").join(REPORT_FILE));
    }

    #[test]
    fn test_prefix_match_alone_does_not_qualify() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_report(root, "parent", &["org.parent"]);
        fs::create_dir_all(root.join("parent/child")).unwrap();

        let source = root.join("parent/child/src/org/example/FooTest.java");
        let err = selector(root, &["parent", "parent/child"])
            .select(&loc(), &source)
            .unwrap_err();
        assert!(matches!(err, Error::Selection { .. }));
    }

    #[test]
    fn test_candidate_must_contain_source() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_report(root, "mod-a", &["org.example"]);
        write_report(root, "mod-ab", &["org.example"]);

        let source = root.join("mod-ab/src/org/example/FooTest.java");
        let selected = selector(root, &["mod-a", "mod-ab"])
            .select(&loc(), &source)
            .unwrap();
        assert_eq!(selected, root.join("mod-ab").join(REPORT_FILE));
    }

    #[test]
    fn test_package_match_is_exact() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_report(root, "mod-a", &["org.example.web", "org"]);

        let source = root.join("mod-a/src/org/example/FooTest.java");
        assert!(matches!(
            selector(root, &["mod-a"]).select(&loc(), &source),
            Err(Error::Selection { .. })
        ));
    }

    #[test]
    fn test_tied_candidates_are_ambiguous() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_report(root, "x", &["org.example"]);
        write_report(root, "x/y", &["org.example"]);

        let source = root.join("x/y/src/org/example/FooTest.java");
        let err = selector(root, &["x/y", "./x"])
            .select(&loc(), &source)
            .unwrap_err();
        match err {
            Error::AmbiguousSelection { candidates, .. } => {
                assert_eq!(candidates, vec!["x/y".to_string(), "./x".to_string()]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_candidates_are_not_ambiguous() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write_report(root, "mod-a", &["org.example"]);

        let source = root.join("mod-a/src/org/example/FooTest.java");
        let selected = selector(root, &["mod-a", "mod-a"])
            .select(&loc(), &source)
            .unwrap();
        assert_eq!(selected, root.join("mod-a").join(REPORT_FILE));
    }

    #[test]
    fn test_malformed_report_propagates() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let path = root.join("mod-a").join(REPORT_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"<report><counter type="LINE"/></report>"#).unwrap();

        let source = root.join("mod-a/src/org/example/FooTest.java");
        assert!(matches!(
            selector(root, &["mod-a"]).select(&loc(), &source),
            Err(Error::Structural { .. })
        ));
    }

    #[test]
    fn test_no_candidates() {
        let selector = ReportSelector::new(".", REPORT_FILE, Vec::new());
        let err = selector
            .select(&loc(), Path::new("./a/org/example/FooTest.java"))
            .unwrap_err();
        assert!(matches!(err, Error::Selection { .. }));
    }
}
