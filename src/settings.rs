//! User settings: the watched currencies and stocks.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Currency codes and tickers the user wants quotes for.
///
/// Stored as JSON, for example
/// `{"user_currencies": ["USD", "EUR"], "user_stocks": ["AAPL", "AMZN"]}`.
/// A missing key reads as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlists {
    /// ISO currency codes.
    #[serde(default, rename = "user_currencies")]
    pub currencies: Vec<String>,
    /// Stock ticker symbols.
    #[serde(default, rename = "user_stocks")]
    pub stocks: Vec<String>,
}

impl Watchlists {
    /// Parses a settings document.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::WrongType`] if a key holds something other
    /// than a list of strings, or [`ReportError::Serialization`] if the text
    /// is not JSON at all.
    #[inline]
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| {
            if err.is_data() {
                ReportError::WrongType(err.to_string())
            } else {
                ReportError::Serialization(err)
            }
        })
    }
}

/// Reads the watch-lists from a JSON settings file.
///
/// # Errors
///
/// Returns [`ReportError::SourceUnavailable`] if the file does not exist,
/// [`ReportError::Io`] if it cannot be read, and the errors of
/// [`Watchlists::from_json`] for its contents.
#[inline]
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_watchlists(path: &Path) -> Result<Watchlists> {
    let text = fs::read_to_string(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            ReportError::SourceUnavailable {
                path: path.to_path_buf(),
            }
        } else {
            ReportError::Io(err)
        }
    })?;
    let watchlists = Watchlists::from_json(&text)?;
    tracing::debug!(
        currencies = watchlists.currencies.len(),
        stocks = watchlists.stocks.len(),
        "settings loaded"
    );
    Ok(watchlists)
}
