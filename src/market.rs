//! Market data sources for the watched currencies and stocks.
//!
//! The [`MarketData`] trait is the seam between the events report and the
//! outside world. [`crate::client::MarketClient`] implements it over HTTP;
//! [`FixedMarketData`] serves canned quotes without any I/O.

mod fixed;

pub use fixed::FixedMarketData;

use crate::error::{ReportError, Result};
use crate::models::{CurrencyRate, StockPrice};

/// Source of exchange rates and end-of-day stock prices.
pub trait MarketData: core::fmt::Debug + Send + Sync {
    /// Returns one rate per code, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::EmptyList`] if `codes` is empty, or
    /// [`ReportError::RatesUnavailable`] if the source cannot be reached.
    fn currency_rates(&self, codes: &[String]) -> Result<Vec<CurrencyRate>>;

    /// Returns the latest close for each ticker the source knows about.
    ///
    /// Tickers without a quote are left out.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::EmptyList`] if `tickers` is empty, or
    /// [`ReportError::PricesUnavailable`] if the source cannot be reached.
    fn stock_prices(&self, tickers: &[String]) -> Result<Vec<StockPrice>>;
}

/// Rejects an empty watch-list with `message`.
pub(crate) fn require_codes(codes: &[String], message: &'static str) -> Result<()> {
    if codes.is_empty() {
        tracing::warn!(message, "empty watch-list");
        return Err(ReportError::EmptyList(message));
    }
    Ok(())
}

/// Message for an empty currency list.
pub(crate) const EMPTY_CURRENCIES: &str = "Currency list is empty";
/// Message for an empty stock list.
pub(crate) const EMPTY_STOCKS: &str = "Stock list is empty";
