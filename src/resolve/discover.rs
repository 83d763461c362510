//! Discovering candidate build units on disk.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::Result;

/// Build-unit directories under `root` that contain `marker`.
///
/// A directory whose path ends with `marker` (e.g. `target/surefire-reports`)
/// marks the directory `marker` is nested in as a build unit. The marker
/// subtree itself is not descended into. Results keep the `root` prefix and are
/// sorted and deduplicated.
pub fn discover_units(root: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    let marker = Path::new(marker);
    let depth = marker.components().count();
    let mut units = BTreeSet::new();

    if depth == 0 {
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() || entry.depth() < depth {
            continue;
        }
        if entry.path().ends_with(marker) {
            if let Some(unit) = entry.path().ancestors().nth(depth) {
                units.insert(unit.to_path_buf());
            }
            walker.skip_current_dir();
        }
    }

    Ok(units.into_iter().collect())
}
