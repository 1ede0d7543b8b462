//! Sheetfolio Engine - Sheet parsing, row normalization and portfolio aggregation

pub mod analytics;
pub mod ingest;
pub mod pipeline;

pub use analytics::{aggregate, Aggregation};
pub use ingest::{classify_and_normalize, parse_sheet_response, NormalizedRows};
pub use pipeline::{attach_history, build_dashboard, build_from_table};
