//! SQLite database management

mod connection;
mod settings;
mod snapshots;

pub use connection::Database;
pub use settings::*;
pub use snapshots::*;
