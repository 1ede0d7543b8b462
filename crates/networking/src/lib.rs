//! Sheetfolio Networking - HTTP client and fetch helpers for the sheet query endpoint

pub mod api;
pub mod http;

pub use api::{fetch_dashboard, fetch_tab};
pub use http::SheetsClient;
