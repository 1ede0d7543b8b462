//! High-level wrappers around the raw HTTP client
//!
//! These add input validation and run the fetched text through the engine
//! so callers get a finished model.

mod dashboard;

pub use dashboard::*;
