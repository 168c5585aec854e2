//! In-memory market data for tests and offline runs.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;

use super::{EMPTY_CURRENCIES, EMPTY_STOCKS, MarketData, require_codes};
use crate::error::Result;
use crate::models::{CurrencyRate, StockPrice};

/// Market data served from fixed tables.
///
/// Unknown currencies get a rate of `0.0`, matching a lookup whose response
/// has no quote for them; unknown tickers are skipped. Every call is
/// counted, so tests can assert that no lookup happened.
///
/// # Example
///
/// ```rust
/// use ledger_reports::market::{FixedMarketData, MarketData};
///
/// let market = FixedMarketData::new().with_rate("USD", 73.21);
/// let rates = market.currency_rates(&["USD".to_owned()]).unwrap();
/// assert_eq!(rates[0].rate, 73.21);
/// ```
#[derive(Debug, Default)]
pub struct FixedMarketData {
    /// Rate per currency code.
    rates: HashMap<String, f64>,
    /// Close per ticker.
    prices: HashMap<String, f64>,
    /// Number of lookups served.
    calls: AtomicUsize,
}

impl FixedMarketData {
    /// Creates an empty source.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate for `code`.
    #[inline]
    #[must_use]
    pub fn with_rate<T: Into<String>>(mut self, code: T, rate: f64) -> Self {
        _ = self.rates.insert(code.into(), rate);
        self
    }

    /// Adds a close for `ticker`.
    #[inline]
    #[must_use]
    pub fn with_price<T: Into<String>>(mut self, ticker: T, price: f64) -> Self {
        _ = self.prices.insert(ticker.into(), price);
        self
    }

    /// Returns how many lookups were made, empty-list rejections included.
    #[inline]
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Records one lookup.
    fn count_call(&self) {
        _ = self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl MarketData for FixedMarketData {
    #[inline]
    fn currency_rates(&self, codes: &[String]) -> Result<Vec<CurrencyRate>> {
        self.count_call();
        require_codes(codes, EMPTY_CURRENCIES)?;
        Ok(codes
            .iter()
            .map(|code| CurrencyRate {
                currency: code.clone(),
                rate: self.rates.get(code).copied().unwrap_or(0.0_f64),
            })
            .collect())
    }

    #[inline]
    fn stock_prices(&self, tickers: &[String]) -> Result<Vec<StockPrice>> {
        self.count_call();
        require_codes(tickers, EMPTY_STOCKS)?;
        Ok(tickers
            .iter()
            .filter_map(|ticker| {
                self.prices.get(ticker).map(|&price| StockPrice {
                    stock: ticker.clone(),
                    price,
                })
            })
            .collect())
    }
}
