//! Locating the source file that defines a test class.

use std::collections::HashMap;
use std::path::PathBuf;

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

use crate::core::{Error, Location, Result};

/// Finds test class sources by walking a directory tree.
///
/// Lookups are memoized by [`Location`]; a cached lookup returns the same
/// path a fresh walk would.
#[derive(Debug)]
pub struct SourceResolver {
    root: PathBuf,
    extension: String,
    exclude: Option<GlobSet>,
    cache: HashMap<Location, PathBuf>,
}

impl SourceResolver {
    /// Create a resolver walking `root` for files with `extension`.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            exclude: None,
            cache: HashMap::new(),
        }
    }

    /// Skip paths (relative to the root) matching any of `patterns`.
    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            self.exclude = None;
            return Ok(self);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::config(format!("invalid exclude pattern {pattern}: {e}")))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| Error::config(format!("invalid exclude patterns: {e}")))?;
        self.exclude = Some(set);
        Ok(self)
    }

    /// Resolve the source path for `loc`, walking the tree on a cache miss.
    pub fn resolve(&mut self, loc: &Location) -> Result<PathBuf> {
        if let Some(path) = self.cache.get(loc) {
            return Ok(path.clone());
        }
        let path = self.find(loc)?;
        self.cache.insert(loc.clone(), path.clone());
        Ok(path)
    }

    /// Walk the tree for the first `<Class>.<ext>` whose directory ends with
    /// the package directory.
    ///
    /// Entries are visited in file-name order, so duplicated package and
    /// class names across build units always resolve to the same file.
    pub fn find(&self, loc: &Location) -> Result<PathBuf> {
        let package_dir = loc.package_dir();
        let file_name = loc.source_file_name(&self.extension);

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() != file_name.as_str() {
                continue;
            }
            let in_package = entry
                .path()
                .parent()
                .is_some_and(|dir| dir.ends_with(&package_dir));
            if in_package {
                return Ok(entry.into_path());
            }
        }

        Err(Error::Resolution {
            package: loc.package.clone(),
            file: file_name,
            root: self.root.clone(),
        })
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let Some(set) = &self.exclude else {
            return false;
        };
        if entry.depth() == 0 {
            return false;
        }
        entry
            .path()
            .strip_prefix(&self.root)
            .is_ok_and(|rel| set.is_match(rel))
    }
}
