//! Qualified test-method identifiers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Error, Result};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w+(?:\.\w+)*)\.(\w+)#(\w+)$").expect("valid regex")
});

/// A test method named by `<dotted-package>.<ClassName>#<methodName>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Dotted package, e.g. `org.apache.shiro.web`.
    pub package: String,
    /// Class name.
    pub classes: String,
    /// Method name.
    pub method: String,
}

impl Location {
    pub fn new(
        package: impl Into<String>,
        classes: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            classes: classes.into(),
            method: method.into(),
        }
    }

    /// Parse a qualified test-method identifier.
    pub fn parse(input: &str) -> Result<Self> {
        let err = |reason: &str| Error::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if !input.contains('#') {
            return Err(err("missing '#' before the method name"));
        }

        let caps = IDENTIFIER
            .captures(input)
            .ok_or_else(|| err("expected <package>.<Class>#<method>"))?;

        Ok(Self::new(&caps[1], &caps[2], &caps[3]))
    }

    /// Package as a relative directory, `a.b.c` -> `a/b/c`.
    pub fn package_dir(&self) -> PathBuf {
        self.package.split('.').collect()
    }

    /// Source file name for the class with the given extension.
    pub fn source_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.classes, extension)
    }

    /// Fully qualified class name.
    pub fn qualified_class(&self) -> String {
        format!("{}.{}", self.package, self.classes)
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}#{}", self.package, self.classes, self.method)
    }
}
