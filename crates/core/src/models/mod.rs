//! Data models for the dashboard pipeline

mod asset;
mod cell;
mod history;
mod portfolio;
mod table;
mod transaction;

pub use asset::*;
pub use cell::*;
pub use history::*;
pub use portfolio::*;
pub use table::*;
pub use transaction::*;
