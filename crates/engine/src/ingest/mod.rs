//! Ingestion: response unwrapping, cell decoding, row classification

pub mod classifier;
pub mod decoder;
pub mod parser;

pub use classifier::{classify_and_normalize, detect_layout, NormalizedRows, RowKind, SkipReason};
pub use decoder::{decode_date, decode_number, decode_text, decode_value, Scalar};
pub use parser::parse_sheet_response;
