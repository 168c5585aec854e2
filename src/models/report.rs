//! Report result types.
//!
//! Every report is built fresh per call and serialized straight to the JSON
//! wire format; nothing here is mutated after construction.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;

/// Largest magnitude at which every integer is exactly representable in an
/// `f64` (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Writes an amount as an integer when it has no fractional part, and as a
/// float rounded to cents otherwise.
#[allow(
    clippy::cast_possible_truncation,
    reason = "value is integral and within the exactly representable range"
)]
#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "serde's serialize_with passes fields by reference"
)]
fn serialize_amount<S: Serializer>(
    value: &f64,
    serializer: S,
) -> core::result::Result<S::Ok, S::Error> {
    let amount = *value;
    if amount.fract() == 0.0_f64 && amount.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(amount as i64)
    } else {
        serializer.serialize_f64((amount * 100.0_f64).round() / 100.0_f64)
    }
}

/// Summed amount for one category (or income description).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Category label.
    pub category: String,
    /// Summed amount in the ledger currency.
    #[serde(serialize_with = "serialize_amount")]
    pub amount: f64,
}

impl CategoryTotal {
    /// Creates a total.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>>(category: T, amount: f64) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}

/// Spending breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensesReport {
    /// Regular expenses plus cash and transfers, in whole units.
    pub total_amount: i64,
    /// Top expense categories, with an optional `Other` bucket.
    pub main: Vec<CategoryTotal>,
    /// Cash withdrawals and transfers, reported apart from `main`.
    pub transfers_and_cash: Vec<CategoryTotal>,
}

/// Incoming funds broken down by description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeReport {
    /// Sum of all deposits, in whole units.
    pub total_amount: i64,
    /// One entry per deposit description, largest first.
    pub main: Vec<CategoryTotal>,
}

/// Exchange rate of a watched currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    /// ISO code of the watched currency.
    pub currency: String,
    /// Price of one unit in the quote currency.
    pub rate: f64,
}

/// Closing price of a watched stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPrice {
    /// Ticker symbol.
    pub stock: String,
    /// End-of-day close.
    pub price: f64,
}

/// Merged events report: spending, income and market data for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsReport {
    /// Spending within the window.
    pub expenses: ExpensesReport,
    /// Income within the window.
    pub income: IncomeReport,
    /// Rates for the watched currencies.
    pub currency_rates: Vec<CurrencyRate>,
    /// Prices for the watched stocks.
    pub stock_prices: Vec<StockPrice>,
}

impl EventsReport {
    /// Serializes the report as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ReportError::Serialization`] if a value is
    /// not representable in JSON.
    #[inline]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_amount_serializes_as_integer() {
        let json = serde_json::to_string(&CategoryTotal::new("Cash", 8000.0)).unwrap();
        assert_eq!(json, r#"{"category":"Cash","amount":8000}"#);
    }

    #[test]
    fn fractional_amount_keeps_cents() {
        let json = serde_json::to_string(&CategoryTotal::new("Supermarkets", 321.78)).unwrap();
        assert_eq!(json, r#"{"category":"Supermarkets","amount":321.78}"#);
    }

    #[test]
    fn category_total_accepts_integer_json() {
        let total: CategoryTotal =
            serde_json::from_str(r#"{"category":"Transfers","amount":3250}"#).unwrap();
        assert_eq!(total, CategoryTotal::new("Transfers", 3250.0));
    }

    #[test]
    fn events_report_has_flat_top_level_keys() {
        let report = EventsReport {
            expenses: ExpensesReport {
                total_amount: 0,
                main: vec![],
                transfers_and_cash: vec![],
            },
            income: IncomeReport {
                total_amount: 0,
                main: vec![],
            },
            currency_rates: vec![CurrencyRate {
                currency: "USD".to_owned(),
                rate: 73.21,
            }],
            stock_prices: vec![],
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(
            keys,
            ["currency_rates", "expenses", "income", "stock_prices"]
        );
        assert_eq!(value["currency_rates"][0]["rate"], 73.21);
    }
}
