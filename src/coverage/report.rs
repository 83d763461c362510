//! Coverage report parsing.
//!
//! Reports are XML documents with a strict four-level layout:
//!
//! ```text
//! <report>
//!   <package name="org.example">
//!     <class name="FooTest">
//!       <method name="bar">
//!         <counter type="INSTRUCTIONS" missed="3" covered="7"/>
//!       </method>
//!     </class>
//!   </package>
//! </report>
//! ```
//!
//! Any element outside this nesting rejects the whole report.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};

use super::{CoverageCounter, CoverageRecord};
use crate::core::{Error, Location, Result};

const PACKAGE: &str = "package";
const CLASS: &str = "class";
const METHOD: &str = "method";
const COUNTER: &str = "counter";

/// Parse the report at `path` into one record per method element.
pub fn parse_report(path: &Path) -> Result<Vec<CoverageRecord>> {
    let content = fs::read_to_string(path)?;
    parse_report_str(&content, path)
}

/// Parse report content; `origin` is only used in error messages.
pub fn parse_report_str(content: &str, origin: &Path) -> Result<Vec<CoverageRecord>> {
    let doc = parse_document(content, origin)?;
    let mut records = Vec::new();

    for package in child_elements(doc.root_element()) {
        expect_tag(&doc, package, PACKAGE, origin)?;
        let package_name = name_of(package);

        for class in child_elements(package) {
            expect_tag(&doc, class, CLASS, origin)?;
            let class_name = name_of(class);

            for method in child_elements(class) {
                expect_tag(&doc, method, METHOD, origin)?;
                let loc = Location::new(package_name, class_name, name_of(method));

                let mut counters = BTreeMap::new();
                for counter in child_elements(method) {
                    expect_tag(&doc, counter, COUNTER, origin)?;
                    if let Some(child) = child_elements(counter).next() {
                        return Err(unexpected(&doc, child, COUNTER, origin));
                    }
                    let metric = counter.attribute("type").unwrap_or_default();
                    let missed = count_attribute(&doc, counter, "missed", origin)?;
                    let covered = count_attribute(&doc, counter, "covered", origin)?;
                    counters.insert(metric.to_string(), CoverageCounter::new(missed, covered));
                }

                records.push(CoverageRecord::new(loc, counters));
            }
        }
    }

    Ok(records)
}

/// Whether the report at `path` exists and has a package named exactly `package`.
///
/// Only the top level is inspected, but every top-level element must be a
/// package element.
pub fn declares_package(path: &Path, package: &str) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }

    let content = fs::read_to_string(path)?;
    let doc = parse_document(&content, path)?;

    let mut found = false;
    for node in child_elements(doc.root_element()) {
        expect_tag(&doc, node, PACKAGE, path)?;
        if name_of(node) == package {
            found = true;
        }
    }
    Ok(found)
}

fn parse_document<'i>(content: &'i str, origin: &Path) -> Result<Document<'i>> {
    // JaCoCo emits a DOCTYPE pointing at an external DTD, which is never loaded.
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;

    Document::parse_with_options(content, options)
        .map_err(|e| Error::structural(origin, format!("invalid XML: {e}")))
}

fn child_elements<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(|n| n.is_element())
}

fn name_of<'a>(node: Node<'a, '_>) -> &'a str {
    node.attribute("name").unwrap_or_default()
}

fn expect_tag(doc: &Document<'_>, node: Node<'_, '_>, expected: &str, origin: &Path) -> Result<()> {
    if node.tag_name().name() == expected {
        return Ok(());
    }
    let parent = node
        .parent_element()
        .map(|p| p.tag_name().name())
        .unwrap_or("document");
    Err(unexpected(doc, node, parent, origin))
}

fn unexpected(doc: &Document<'_>, node: Node<'_, '_>, parent: &str, origin: &Path) -> Error {
    let pos = doc.text_pos_at(node.range().start);
    Error::structural(
        origin,
        format!(
            "unexpected <{}> inside <{}> at {}:{}",
            node.tag_name().name(),
            parent,
            pos.row,
            pos.col
        ),
    )
}

fn count_attribute(doc: &Document<'_>, node: Node<'_, '_>, attr: &str, origin: &Path) -> Result<u64> {
    let Some(raw) = node.attribute(attr) else {
        return Ok(0);
    };
    raw.trim().parse::<u64>().map_err(|_| {
        let pos = doc.text_pos_at(node.range().start);
        Error::structural(
            origin,
            format!(
                "{attr}=\"{raw}\" is not a non-negative integer at {}:{}",
                pos.row, pos.col
            ),
        )
    })
}
