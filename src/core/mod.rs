//! Core types shared by every stage of coverage collection.

mod error;
mod location;
pub mod progress;

pub use error::{Error, ErrorKind, Result};
pub use location::Location;
pub use progress::ProgressTracker;
