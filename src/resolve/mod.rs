//! Mapping a test location to the coverage report that covers it.
//!
//! There is no declared mapping from packages to build units, so it is
//! inferred: find the test class source on disk, then pick the most deeply
//! nested build unit that contains it and whose report lists the package.

mod discover;
mod select;
mod source;

pub use discover::discover_units;
pub use select::ReportSelector;
pub use source::SourceResolver;
