//! Transaction model.

use core::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ReportError, Result};

/// Text substituted for a missing category or description before matching.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Day-first formats accepted for the operation date column.
const OPERATION_DATE_FORMATS: [&str; 2] = ["%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"];

/// Format used when rendering a parsed operation date.
const OPERATION_DATE_DISPLAY: &str = "%d.%m.%Y %H:%M:%S";

/// Day-first date-only format.
const OPERATION_DAY_FORMAT: &str = "%d.%m.%Y";

/// Operation date cell, either as exported text or parsed.
///
/// Spreadsheet exports carry day-first text such as `31.12.2021 16:44:00`.
/// [`OperationDate::normalized`] turns it into a typed timestamp; already
/// typed values pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationDate {
    /// Raw cell text, not parsed yet.
    Text(String),
    /// Parsed date and time.
    Timestamp(NaiveDateTime),
}

impl OperationDate {
    /// Parses day-first text (`31.12.2021 16:44:00` or `31.12.2021`).
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDate`] carrying the input when no
    /// format matches.
    #[inline]
    pub fn parse(raw: &str) -> Result<NaiveDateTime> {
        let text = raw.trim();
        OPERATION_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(text, OPERATION_DAY_FORMAT)
                    .ok()
                    .map(|day| day.and_time(NaiveTime::MIN))
            })
            .ok_or_else(|| ReportError::InvalidDate(raw.to_owned()))
    }

    /// Returns the typed form of this date. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDate`] if raw text cannot be parsed.
    #[inline]
    pub fn normalized(self) -> Result<Self> {
        match self {
            Self::Text(raw) => Self::parse(&raw).map(Self::Timestamp),
            Self::Timestamp(_) => Ok(self),
        }
    }

    /// Returns the timestamp if this date has been parsed.
    #[inline]
    #[must_use]
    pub const fn timestamp(&self) -> Option<NaiveDateTime> {
        match *self {
            Self::Timestamp(ts) => Some(ts),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for OperationDate {
    #[inline]
    #[allow(
        clippy::ref_patterns,
        reason = "binding borrowed variant data requires `ref` under pattern_type_mismatch"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Text(ref raw) => f.write_str(raw),
            Self::Timestamp(ts) => write!(f, "{}", ts.format(OPERATION_DATE_DISPLAY)),
        }
    }
}

impl From<NaiveDateTime> for OperationDate {
    #[inline]
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl Serialize for OperationDate {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OperationDate {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Text)
    }
}

/// One row of the bank operations export.
///
/// Field names follow the export's column headers when serialized, so the
/// JSON record view of a row reads like the spreadsheet it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Date and time the operation happened.
    #[serde(rename = "Operation date")]
    pub operation_date: Option<OperationDate>,
    /// Date the payment was settled (day-first text).
    #[serde(rename = "Payment date")]
    pub payment_date: Option<String>,
    /// Masked card number, e.g. `*7197`.
    #[serde(rename = "Card number")]
    pub card_number: Option<String>,
    /// Processing status (`OK`, `FAILED`).
    #[serde(rename = "Status")]
    pub status: Option<String>,
    /// Signed operation amount; negative for spending.
    #[serde(rename = "Operation amount")]
    pub operation_amount: f64,
    /// Operation currency code.
    #[serde(rename = "Operation currency")]
    pub operation_currency: Option<String>,
    /// Signed amount in the payment currency.
    #[serde(rename = "Payment amount")]
    pub payment_amount: f64,
    /// Payment currency code.
    #[serde(rename = "Payment currency")]
    pub payment_currency: Option<String>,
    /// Cashback credited for the operation.
    #[serde(rename = "Cashback")]
    pub cashback: Option<f64>,
    /// Spending category assigned by the bank.
    #[serde(rename = "Category")]
    pub category: Option<String>,
    /// Merchant Category Code.
    #[serde(rename = "MCC")]
    pub mcc: Option<i32>,
    /// Free-text description (merchant name, top-up source).
    #[serde(rename = "Description")]
    pub description: Option<String>,
    /// Bonuses, cashback included.
    #[serde(rename = "Bonuses (including cashback)")]
    pub bonuses: f64,
    /// Amount rounded up into the savings box.
    #[serde(rename = "Round-up to savings")]
    pub round_up: f64,
    /// Operation amount as pre-rounded by the bank; the figure all
    /// reports sum.
    #[serde(rename = "Operation amount with rounding")]
    pub rounded_amount: f64,
}

impl Transaction {
    /// Returns the operation timestamp if the date has been parsed.
    #[inline]
    #[must_use]
    pub fn operation_time(&self) -> Option<NaiveDateTime> {
        self.operation_date.as_ref().and_then(OperationDate::timestamp)
    }

    /// Returns the operation timestamp, parsing raw date text if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDate`] if the date text is not
    /// day-first.
    #[inline]
    #[allow(
        clippy::ref_patterns,
        reason = "binding borrowed variant data requires `ref` under pattern_type_mismatch"
    )]
    pub fn resolved_time(&self) -> Result<Option<NaiveDateTime>> {
        match self.operation_date {
            Some(OperationDate::Timestamp(ts)) => Ok(Some(ts)),
            Some(OperationDate::Text(ref raw)) => OperationDate::parse(raw).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the category, or [`NOT_SPECIFIED`] when absent.
    #[inline]
    #[must_use]
    pub fn category_text(&self) -> &str {
        self.category.as_deref().unwrap_or(NOT_SPECIFIED)
    }

    /// Returns the description, or [`NOT_SPECIFIED`] when absent.
    #[inline]
    #[must_use]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or(NOT_SPECIFIED)
    }
}
