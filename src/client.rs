//! Blocking HTTP client for the currency and stock quote services.
//!
//! Exchange rates come from the apilayer currency-data `change` endpoint,
//! one request per currency. Stock closes come from the marketstack `eod`
//! endpoint in a single batched request.

use chrono::{Days, Local, NaiveDate};
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;
use url::Url;

use crate::error::{ReportError, Result};
use crate::market::{EMPTY_CURRENCIES, EMPTY_STOCKS, MarketData, require_codes};
use crate::models::{CurrencyRate, StockPrice};

/// Base URL of the currency-data service.
const DEFAULT_CURRENCY_BASE_URL: &str = "https://api.apilayer.com";

/// Currency change endpoint path.
const CURRENCY_CHANGE_PATH: &str = "/currency_data/change";

/// Base URL of the stock market data service.
const DEFAULT_STOCK_BASE_URL: &str = "https://api.marketstack.com";

/// End-of-day quotes endpoint path.
const STOCK_EOD_PATH: &str = "/v1/eod";

/// Currency rates are quoted in.
const DEFAULT_QUOTE_CURRENCY: &str = "RUB";

/// How far back stock closes are requested, so the date lands on a day
/// the service already has data for.
const STOCK_LOOKBACK_DAYS: u64 = 4;

/// Header carrying the currency-data API key.
const API_KEY_HEADER: &str = "apikey";

/// Date format of query parameters.
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Builder for constructing a [`MarketClient`].
#[derive(Debug)]
pub struct MarketClientBuilder {
    /// API key of the currency-data service.
    currency_api_key: Option<SecretString>,
    /// API key of the stock data service.
    stock_api_key: Option<SecretString>,
    /// Currency-data base URL override (for testing).
    currency_base_url: Option<String>,
    /// Stock data base URL override (for testing).
    stock_base_url: Option<String>,
    /// Quote currency override.
    quote_currency: Option<String>,
    /// Fixed lookup day instead of today.
    as_of: Option<NaiveDate>,
}

impl MarketClientBuilder {
    /// Sets the currency-data API key.
    #[inline]
    #[must_use]
    pub fn currency_api_key<T: Into<String>>(mut self, key: T) -> Self {
        self.currency_api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Sets the stock data API key.
    #[inline]
    #[must_use]
    pub fn stock_api_key<T: Into<String>>(mut self, key: T) -> Self {
        self.stock_api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Overrides the currency-data base URL (useful for testing with a mock
    /// server).
    #[inline]
    #[must_use]
    pub fn currency_base_url<T: Into<String>>(mut self, url: T) -> Self {
        self.currency_base_url = Some(url.into());
        self
    }

    /// Overrides the stock data base URL (useful for testing with a mock
    /// server).
    #[inline]
    #[must_use]
    pub fn stock_base_url<T: Into<String>>(mut self, url: T) -> Self {
        self.stock_base_url = Some(url.into());
        self
    }

    /// Sets the currency rates are quoted in (`RUB` by default).
    #[inline]
    #[must_use]
    pub fn quote_currency<T: Into<String>>(mut self, code: T) -> Self {
        self.quote_currency = Some(code.into());
        self
    }

    /// Pins the lookup day instead of using the current local date.
    #[inline]
    #[must_use]
    pub const fn as_of(mut self, day: NaiveDate) -> Self {
        self.as_of = Some(day);
        self
    }

    /// Builds the client.
    ///
    /// Missing API keys are not an error here; the lookup that needs the
    /// key fails instead.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidUrl`] if a base URL is malformed.
    /// Returns [`ReportError::Http`] if the HTTP client fails to build.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<MarketClient> {
        let currency_base = self
            .currency_base_url
            .unwrap_or_else(|| DEFAULT_CURRENCY_BASE_URL.to_owned());
        let stock_base = self
            .stock_base_url
            .unwrap_or_else(|| DEFAULT_STOCK_BASE_URL.to_owned());
        tracing::debug!(
            currency_base = %currency_base,
            stock_base = %stock_base,
            "building market client"
        );
        let currency_url = endpoint(&currency_base, CURRENCY_CHANGE_PATH)?;
        let stock_url = endpoint(&stock_base, STOCK_EOD_PATH)?;
        let http = reqwest::blocking::Client::builder().build()?;

        Ok(MarketClient {
            http,
            currency_api_key: self.currency_api_key,
            stock_api_key: self.stock_api_key,
            currency_url,
            stock_url,
            quote_currency: self
                .quote_currency
                .unwrap_or_else(|| DEFAULT_QUOTE_CURRENCY.to_owned()),
            as_of: self.as_of,
        })
    }
}

/// Joins a base URL and an endpoint path.
fn endpoint(base: &str, path: &str) -> Result<Url> {
    Url::parse(&format!("{}{path}", base.trim_end_matches('/'))).map_err(ReportError::from)
}

/// Blocking client for currency rates and stock closes.
///
/// Use [`MarketClient::builder()`] to construct an instance.
#[derive(Debug)]
pub struct MarketClient {
    /// Underlying HTTP client.
    http: reqwest::blocking::Client,
    /// API key of the currency-data service.
    currency_api_key: Option<SecretString>,
    /// API key of the stock data service.
    stock_api_key: Option<SecretString>,
    /// Full URL of the currency change endpoint.
    currency_url: Url,
    /// Full URL of the end-of-day endpoint.
    stock_url: Url,
    /// Currency rates are quoted in.
    quote_currency: String,
    /// Fixed lookup day, if any.
    as_of: Option<NaiveDate>,
}

impl MarketClient {
    /// Creates a new builder for configuring the client.
    #[inline]
    #[must_use]
    pub const fn builder() -> MarketClientBuilder {
        MarketClientBuilder {
            currency_api_key: None,
            stock_api_key: None,
            currency_base_url: None,
            stock_base_url: None,
            quote_currency: None,
            as_of: None,
        }
    }

    /// Returns the day lookups are made for.
    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Sends a GET request and parses the JSON body.
    ///
    /// Failures are flattened to a message, which the caller wraps in the
    /// error variant of its lookup.
    #[tracing::instrument(skip_all, fields(path = %url.path()))]
    fn get_json(
        &self,
        url: Url,
        api_key: Option<&SecretString>,
    ) -> core::result::Result<Value, String> {
        let mut request = self.http.get(url);
        if let Some(key) = api_key {
            request = request.header(API_KEY_HEADER, key.expose_secret());
        }
        let response = request.send().map_err(|err| err.to_string())?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");
        if status.is_success() {
            let body = response.text().map_err(|err| err.to_string())?;
            tracing::trace!(body_len = body.len(), "parsing response body");
            serde_json::from_str(&body).map_err(|err| err.to_string())
        } else {
            let message = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_owned());
            tracing::debug!(status = status.as_u16(), message = %message, "API error");
            Err(format!("HTTP {}: {message}", status.as_u16()))
        }
    }

    /// Looks up the rate of one currency for `day`.
    fn currency_rate(&self, key: &SecretString, code: &str, day: &str) -> Result<CurrencyRate> {
        let mut url = self.currency_url.clone();
        _ = url
            .query_pairs_mut()
            .append_pair("start_date", day)
            .append_pair("end_date", day)
            .append_pair("currencies", &self.quote_currency)
            .append_pair("source", code);
        let body = self
            .get_json(url, Some(key))
            .map_err(ReportError::RatesUnavailable)?;

        let pair = format!("{code}{}", self.quote_currency);
        let rate = body
            .get("quotes")
            .and_then(|quotes| quotes.get(pair.as_str()))
            .and_then(|quote| quote.get("end_rate"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0_f64);
        tracing::debug!(currency = code, rate, "currency rate received");
        Ok(CurrencyRate {
            currency: code.to_owned(),
            rate,
        })
    }
}

impl MarketData for MarketClient {
    #[inline]
    #[tracing::instrument(skip_all, fields(count = codes.len()))]
    fn currency_rates(&self, codes: &[String]) -> Result<Vec<CurrencyRate>> {
        require_codes(codes, EMPTY_CURRENCIES)?;
        let key = self.currency_api_key.as_ref().ok_or_else(|| {
            ReportError::RatesUnavailable("currency data API key is not configured".to_owned())
        })?;
        let day = self.today().format(QUERY_DATE_FORMAT).to_string();
        codes
            .iter()
            .map(|code| self.currency_rate(key, code, &day))
            .collect()
    }

    #[inline]
    #[tracing::instrument(skip_all, fields(count = tickers.len()))]
    fn stock_prices(&self, tickers: &[String]) -> Result<Vec<StockPrice>> {
        require_codes(tickers, EMPTY_STOCKS)?;
        let key = self.stock_api_key.as_ref().ok_or_else(|| {
            ReportError::PricesUnavailable("stock data API key is not configured".to_owned())
        })?;
        let day = self
            .today()
            .checked_sub_days(Days::new(STOCK_LOOKBACK_DAYS))
            .ok_or_else(|| ReportError::PricesUnavailable("lookup date out of range".to_owned()))?
            .format(QUERY_DATE_FORMAT)
            .to_string();

        let mut url = self.stock_url.clone();
        _ = url
            .query_pairs_mut()
            .append_pair("access_key", key.expose_secret())
            .append_pair("symbols", &tickers.join(","))
            .append_pair("date_from", &day)
            .append_pair("date_to", &day);
        let body = self
            .get_json(url, None)
            .map_err(ReportError::PricesUnavailable)?;

        let entries = body.get("data").and_then(Value::as_array).ok_or_else(|| {
            ReportError::PricesUnavailable("response has no \"data\" list".to_owned())
        })?;
        let prices: Vec<StockPrice> = entries
            .iter()
            .filter_map(|entry| {
                let stock = entry.get("symbol")?.as_str()?;
                let price = entry.get("close")?.as_f64()?;
                Some(StockPrice {
                    stock: stock.to_owned(),
                    price,
                })
            })
            .collect();
        tracing::debug!(received = prices.len(), "stock prices received");
        Ok(prices)
    }
}
