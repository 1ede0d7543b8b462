//! Error types and Result alias for Sheetfolio

use thiserror::Error;

/// Main error type for Sheetfolio
#[derive(Error, Debug)]
pub enum Error {
    /// The fetched text could not be unwrapped or parsed into a table
    #[error("Malformed sheet response: {0}")]
    MalformedResponse(String),

    /// The table parsed fine but carries no rows
    #[error("Sheet has no rows: {0}")]
    EmptySheet(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Whether the load orchestrator may fall back to a cached snapshot.
    ///
    /// An empty sheet is a real answer from upstream ("no data"), so it is
    /// shown as such instead of being masked by stale data.
    pub fn allows_cache_fallback(&self) -> bool {
        matches!(
            self,
            Error::MalformedResponse(_) | Error::NetworkError(_) | Error::ApiError(_)
        )
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
