//! Error types for the ledger reports library.

use std::path::PathBuf;

/// All errors that can occur while loading a ledger or building reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A required argument was not supplied.
    #[error("{0}")]
    MissingArgument(&'static str),

    /// A value was supplied but has the wrong shape.
    #[error("wrong type: {0}")]
    WrongType(String),

    /// A list argument that must not be empty was empty.
    #[error("{0}")]
    EmptyList(&'static str),

    /// A date string could not be parsed.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// The backing file for a table or settings document does not exist.
    #[error("source unavailable: {}", path.display())]
    SourceUnavailable {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Reading a backing file failed for a reason other than absence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The spreadsheet could not be opened or read.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// A required column header is absent from the spreadsheet.
    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    /// The currency rate lookup failed.
    #[error("currency rates unavailable: {0}")]
    RatesUnavailable(String),

    /// The stock price lookup failed.
    #[error("stock prices unavailable: {0}")]
    PricesUnavailable(String),

    /// The HTTP client could not be constructed or a URL was malformed.
    #[cfg(feature = "blocking")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A configured API base URL is not a valid URL.
    #[cfg(feature = "blocking")]
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = core::result::Result<T, ReportError>;
