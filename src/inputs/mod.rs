//! Loading the test identifier and candidate directory lists.
//!
//! Both lists are JSON arrays of strings prepared ahead of a run.

use std::fs;
use std::path::Path;

use crate::core::{Error, Result};

/// Load the ordered list of test identifiers.
pub fn load_test_methods(path: &Path) -> Result<Vec<String>> {
    load_string_list(path, "test method")
}

/// Load the list of candidate build-unit directories.
pub fn load_report_dirs(path: &Path) -> Result<Vec<String>> {
    load_string_list(path, "report directory")
}

fn load_string_list(path: &Path, what: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::InvalidInput(format!("cannot read {what} list {}: {e}", path.display()))
    })?;
    parse_string_list(&content, what)
        .map_err(|msg| Error::InvalidInput(format!("{}: {msg}", path.display())))
}

fn parse_string_list(content: &str, what: &str) -> std::result::Result<Vec<String>, String> {
    let list: Vec<String> = serde_json::from_str(content)
        .map_err(|e| format!("expected a JSON array of {what} strings ({e})"))?;
    if list.is_empty() {
        return Err(format!("{what} list is empty"));
    }
    Ok(list)
}

/// Save a list in the same format the loaders read.
pub fn save_string_list(path: &Path, items: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(items)?;
    fs::write(path, json)?;
    Ok(())
}
