//! In-memory transaction table.

use chrono::NaiveDateTime;
use serde_json::Value;

use super::{OperationDate, Transaction};
use crate::error::Result;

/// Ordered collection of ledger rows.
///
/// Reports regroup and resort rows, so insertion order carries no meaning.
/// The only change a table ever sees after construction is the one-time
/// parse of its operation dates, done by [`TransactionTable::normalize_dates`],
/// which consumes the table and hands back the typed one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTable {
    /// Rows in load order.
    rows: Vec<Transaction>,
    /// Set once every operation date is known to be a timestamp.
    dates_normalized: bool,
}

impl TransactionTable {
    /// Creates a table from rows whose dates may still be raw text.
    #[inline]
    #[must_use]
    pub const fn new(rows: Vec<Transaction>) -> Self {
        Self {
            rows,
            dates_normalized: false,
        }
    }

    /// Returns the rows.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    /// Consumes the table and returns its rows.
    #[inline]
    #[must_use]
    pub fn into_rows(self) -> Vec<Transaction> {
        self.rows
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Transaction> {
        self.rows.iter()
    }

    /// Returns `true` once [`Self::normalize_dates`] has run.
    #[inline]
    #[must_use]
    pub const fn dates_normalized(&self) -> bool {
        self.dates_normalized
    }

    /// Parses every operation date into a timestamp.
    ///
    /// Running this on an already normalized table returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ReportError::InvalidDate`] for the first
    /// row whose date text is not day-first.
    #[inline]
    #[tracing::instrument(skip_all, fields(rows = self.rows.len()))]
    pub fn normalize_dates(self) -> Result<Self> {
        if self.dates_normalized {
            return Ok(self);
        }
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                row.operation_date = row
                    .operation_date
                    .map(OperationDate::normalized)
                    .transpose()?;
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("operation dates normalized");
        Ok(Self {
            rows,
            dates_normalized: true,
        })
    }

    /// Keeps rows dated within `[start, end]`; `None` start means no lower
    /// bound. Rows without a parsed date are dropped.
    #[must_use]
    pub(crate) fn within(self, start: Option<NaiveDateTime>, end: NaiveDateTime) -> Self {
        let dates_normalized = self.dates_normalized;
        let rows = self
            .rows
            .into_iter()
            .filter(|row| {
                row.operation_time()
                    .is_some_and(|at| at <= end && start.is_none_or(|from| at >= from))
            })
            .collect();
        Self {
            rows,
            dates_normalized,
        }
    }

    /// Renders every row as a JSON object keyed by export column header.
    ///
    /// This is the loose record view consumed by
    /// [`crate::reports::search_records`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ReportError::Serialization`] if a row cannot
    /// be serialized (non-finite amounts).
    #[inline]
    pub fn to_records(&self) -> Result<Vec<Value>> {
        self.rows
            .iter()
            .map(|row| serde_json::to_value(row).map_err(Into::into))
            .collect()
    }
}

impl From<Vec<Transaction>> for TransactionTable {
    #[inline]
    fn from(rows: Vec<Transaction>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<Transaction> for TransactionTable {
    #[inline]
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'table> IntoIterator for &'table TransactionTable {
    type Item = &'table Transaction;
    type IntoIter = core::slice::Iter<'table, Transaction>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::row;

    #[test]
    fn normalize_parses_text_dates() {
        let table = TransactionTable::new(vec![row(
            "31.12.2021 16:44:00",
            "Supermarkets",
            -10.0,
            10.0,
        )]);
        assert!(!table.dates_normalized());
        let typed = table.normalize_dates().unwrap();
        assert!(typed.dates_normalized());
        assert!(typed.rows()[0].operation_time().is_some());
    }

    #[test]
    fn normalize_twice_is_a_no_op() {
        let typed =
            TransactionTable::new(vec![row("01.12.2021 08:00:00", "Cash", -100.0, 100.0)])
                .normalize_dates()
                .unwrap();
        let again = typed.clone().normalize_dates().unwrap();
        assert_eq!(typed, again);
    }

    #[test]
    fn normalize_reports_bad_date_text() {
        let table = TransactionTable::new(vec![row("2021-12-31", "Cash", -1.0, 1.0)]);
        let err = table.normalize_dates().unwrap_err();
        assert!(err.to_string().contains("2021-12-31"));
    }

    #[test]
    fn missing_dates_survive_normalization() {
        let mut tx = row("01.12.2021 08:00:00", "Cash", -1.0, 1.0);
        tx.operation_date = None;
        let typed = TransactionTable::new(vec![tx]).normalize_dates().unwrap();
        assert_eq!(typed.rows()[0].operation_date, None);
    }

    #[test]
    fn within_is_inclusive_and_drops_undated_rows() {
        let mut undated = row("01.12.2021 00:00:00", "Cash", -1.0, 1.0);
        undated.operation_date = None;
        let table = TransactionTable::new(vec![
            row("01.12.2021 00:00:00", "Cash", -1.0, 1.0),
            row("31.12.2021 23:59:59", "Cash", -1.0, 1.0),
            row("01.01.2022 00:00:00", "Cash", -1.0, 1.0),
            undated,
        ])
        .normalize_dates()
        .unwrap();
        let start = OperationDate::parse("01.12.2021 00:00:00").unwrap();
        let end = OperationDate::parse("31.12.2021 23:59:59").unwrap();
        assert_eq!(table.within(Some(start), end).len(), 2);
    }

    #[test]
    fn records_use_export_headers() {
        let table = TransactionTable::new(vec![row(
            "31.12.2021 16:44:00",
            "Supermarkets",
            -10.0,
            10.0,
        )]);
        let records = table.to_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Category"], "Supermarkets");
        assert_eq!(records[0]["Operation date"], "31.12.2021 16:44:00");
    }
}
