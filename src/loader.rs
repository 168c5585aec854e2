//! Spreadsheet loader for the bank operations export.
//!
//! Reads the first sheet of an `.xlsx`, `.xls` or `.ods` workbook with
//! `calamine`. The first row holds the column headers; every following
//! non-empty row becomes a [`Transaction`].

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader as _, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{ReportError, Result};
use crate::models::{OperationDate, Transaction, TransactionTable};

/// Header of the operation date column.
const OPERATION_DATE: &str = "Operation date";
/// Header of the payment date column.
const PAYMENT_DATE: &str = "Payment date";
/// Header of the card number column.
const CARD_NUMBER: &str = "Card number";
/// Header of the status column.
const STATUS: &str = "Status";
/// Header of the operation amount column.
const OPERATION_AMOUNT: &str = "Operation amount";
/// Header of the operation currency column.
const OPERATION_CURRENCY: &str = "Operation currency";
/// Header of the payment amount column.
const PAYMENT_AMOUNT: &str = "Payment amount";
/// Header of the payment currency column.
const PAYMENT_CURRENCY: &str = "Payment currency";
/// Header of the cashback column.
const CASHBACK: &str = "Cashback";
/// Header of the category column.
const CATEGORY: &str = "Category";
/// Header of the MCC column.
const MCC: &str = "MCC";
/// Header of the description column.
const DESCRIPTION: &str = "Description";
/// Header of the bonuses column.
const BONUSES: &str = "Bonuses (including cashback)";
/// Header of the round-up column.
const ROUND_UP: &str = "Round-up to savings";
/// Header of the rounded amount column.
const ROUNDED_AMOUNT: &str = "Operation amount with rounding";

/// Columns every report depends on.
const REQUIRED_COLUMNS: [&str; 5] = [
    OPERATION_DATE,
    OPERATION_AMOUNT,
    CATEGORY,
    DESCRIPTION,
    ROUNDED_AMOUNT,
];

/// Seconds in a day, for spreadsheet serial dates.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Day zero of spreadsheet serial dates (1900 date system, leap-year bug
/// included).
fn serial_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|day| day.and_hms_opt(0, 0, 0))
}

/// Converts a spreadsheet serial date (days since the epoch, fraction =
/// time of day) to a timestamp, to the nearest second.
#[allow(
    clippy::cast_possible_truncation,
    reason = "the value is rounded and checked to be finite and in range first"
)]
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let seconds = (serial * SECONDS_PER_DAY).round();
    if !seconds.is_finite() || seconds.abs() > 1.0e12_f64 {
        return None;
    }
    serial_epoch()?.checked_add_signed(TimeDelta::try_seconds(seconds as i64)?)
}

/// Parses amount text, accepting a decimal comma and spaces as thousands
/// separators. Blank text is zero.
fn parse_amount_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse().ok()
}

/// Column positions, keyed by header text.
#[derive(Debug)]
struct Columns {
    /// Header text to zero-based column index.
    index: HashMap<String, usize>,
}

impl Columns {
    /// Reads the header row and checks that the required columns exist.
    fn from_header(header: &[Data]) -> Result<Self> {
        let index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .filter_map(|(position, cell)| cell_text(cell).map(|text| (text, position)))
            .collect();
        if let Some(&missing) = REQUIRED_COLUMNS
            .iter()
            .find(|&&name| !index.contains_key(name))
        {
            tracing::warn!(column = missing, "required column missing");
            return Err(ReportError::MissingColumn(missing));
        }
        Ok(Self { index })
    }

    /// Returns the cell of `row` under `header`, if both exist.
    fn cell<'row>(&self, row: &'row [Data], header: &str) -> Option<&'row Data> {
        self.index.get(header).and_then(|&position| row.get(position))
    }

    /// Returns the text under `header`.
    fn text(&self, row: &[Data], header: &str) -> Option<String> {
        self.cell(row, header).and_then(cell_text)
    }

    /// Returns the amount under `header`; empty cells read as zero.
    fn amount(&self, row: &[Data], header: &'static str, line: usize) -> Result<f64> {
        self.optional_amount(row, header, line)
            .map(|amount| amount.unwrap_or(0.0_f64))
    }

    /// Returns the amount under `header`, or `None` for an empty cell.
    fn optional_amount(
        &self,
        row: &[Data],
        header: &'static str,
        line: usize,
    ) -> Result<Option<f64>> {
        self.cell(row, header).map_or(Ok(None), |cell| {
            cell_amount(cell).map_err(|found| {
                ReportError::Spreadsheet(format!(
                    "row {line}, column {header:?}: expected a number, found {found:?}"
                ))
            })
        })
    }

    /// Builds one transaction from a data row.
    fn transaction(&self, row: &[Data], line: usize) -> Result<Transaction> {
        Ok(Transaction {
            operation_date: self.cell(row, OPERATION_DATE).and_then(cell_date),
            payment_date: self.text(row, PAYMENT_DATE),
            card_number: self.text(row, CARD_NUMBER),
            status: self.text(row, STATUS),
            operation_amount: self.amount(row, OPERATION_AMOUNT, line)?,
            operation_currency: self.text(row, OPERATION_CURRENCY),
            payment_amount: self.amount(row, PAYMENT_AMOUNT, line)?,
            payment_currency: self.text(row, PAYMENT_CURRENCY),
            cashback: self.optional_amount(row, CASHBACK, line)?,
            category: self.text(row, CATEGORY),
            mcc: self.cell(row, MCC).and_then(cell_code),
            description: self.text(row, DESCRIPTION),
            bonuses: self.amount(row, BONUSES, line)?,
            round_up: self.amount(row, ROUND_UP, line)?,
            rounded_amount: self.amount(row, ROUNDED_AMOUNT, line)?,
        })
    }
}

/// Returns the trimmed text of a cell, `None` when it is blank.
#[allow(
    clippy::ref_patterns,
    reason = "binding borrowed variant data requires `ref` under pattern_type_mismatch"
)]
fn cell_text(cell: &Data) -> Option<String> {
    let text = match *cell {
        Data::String(ref text) | Data::DateTimeIso(ref text) | Data::DurationIso(ref text) => {
            text.trim().to_owned()
        }
        Data::Int(value) => value.to_string(),
        Data::Float(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(ref value) => serial_to_datetime(value.as_f64())
            .map(|at| OperationDate::from(at).to_string())
            .unwrap_or_default(),
        Data::Error(_) | Data::Empty => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

/// Reads a numeric cell. The error carries the offending cell text.
#[allow(
    clippy::cast_precision_loss,
    reason = "spreadsheet integers are amounts well inside f64's exact range"
)]
#[allow(
    clippy::ref_patterns,
    reason = "binding borrowed variant data requires `ref` under pattern_type_mismatch"
)]
fn cell_amount(cell: &Data) -> core::result::Result<Option<f64>, String> {
    match *cell {
        Data::Float(value) => Ok(Some(value)),
        Data::Int(value) => Ok(Some(value as f64)),
        Data::String(ref text) => {
            if text.trim().is_empty() {
                return Ok(None);
            }
            parse_amount_text(text).map(Some).ok_or_else(|| text.clone())
        }
        Data::Empty => Ok(None),
        Data::Bool(_)
        | Data::DateTime(_)
        | Data::DateTimeIso(_)
        | Data::DurationIso(_)
        | Data::Error(_) => Err(cell.to_string()),
    }
}

/// Reads an integer code (MCC). Non-integral or unreadable cells yield
/// `None`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::ref_patterns,
    reason = "the float is checked to be integral and within i32 first; string data is borrowed"
)]
fn cell_code(cell: &Data) -> Option<i32> {
    match *cell {
        Data::Int(value) => i32::try_from(value).ok(),
        Data::Float(value)
            if value.fract() == 0.0_f64
                && value >= f64::from(i32::MIN)
                && value <= f64::from(i32::MAX) =>
        {
            Some(value as i32)
        }
        Data::String(ref text) => text.trim().parse().ok(),
        Data::Float(_)
        | Data::Bool(_)
        | Data::DateTime(_)
        | Data::DateTimeIso(_)
        | Data::DurationIso(_)
        | Data::Error(_)
        | Data::Empty => None,
    }
}

/// Reads the operation date. Typed spreadsheet dates become timestamps;
/// text is kept as-is for [`TransactionTable::normalize_dates`].
#[allow(
    clippy::ref_patterns,
    reason = "binding borrowed variant data requires `ref` under pattern_type_mismatch"
)]
fn cell_date(cell: &Data) -> Option<OperationDate> {
    match *cell {
        Data::DateTime(ref value) => serial_to_datetime(value.as_f64()).map(OperationDate::from),
        Data::Float(value) => serial_to_datetime(value).map(OperationDate::from),
        Data::DateTimeIso(ref text) => Some(
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .map_or_else(|_| OperationDate::Text(text.clone()), OperationDate::from),
        ),
        Data::String(_) | Data::Int(_) | Data::Bool(_) | Data::DurationIso(_) => {
            cell_text(cell).map(OperationDate::Text)
        }
        Data::Error(_) | Data::Empty => None,
    }
}

/// Returns `true` if every cell of the row is blank.
fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| cell_text(cell).is_none())
}

/// Loads the operations export at `path` into a table.
///
/// Operation dates stay as loaded: spreadsheet date cells are already
/// timestamps, text dates are parsed later by
/// [`TransactionTable::normalize_dates`].
///
/// # Errors
///
/// - [`ReportError::SourceUnavailable`] if `path` does not exist.
/// - [`ReportError::Spreadsheet`] if the workbook cannot be opened, has no
///   sheet, or an amount cell is not numeric.
/// - [`ReportError::MissingColumn`] if a required header is absent.
#[inline]
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_transactions(path: &Path) -> Result<TransactionTable> {
    if !path.try_exists()? {
        tracing::warn!("operations file not found");
        return Err(ReportError::SourceUnavailable {
            path: path.to_path_buf(),
        });
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|err| ReportError::Spreadsheet(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::Spreadsheet("workbook has no sheets".to_owned()))?
        .map_err(|err| ReportError::Spreadsheet(err.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ReportError::Spreadsheet("sheet is empty".to_owned()))?;
    let columns = Columns::from_header(header)?;

    let table = rows
        .enumerate()
        .filter(|&(_, row)| !is_blank(row))
        .map(|(offset, row)| columns.transaction(row, offset.saturating_add(2)))
        .collect::<Result<TransactionTable>>()?;
    tracing::info!(rows = table.len(), "operations loaded");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use calamine::CellErrorType;

    use super::*;

    fn header() -> Vec<Data> {
        [
            OPERATION_DATE,
            STATUS,
            OPERATION_AMOUNT,
            CASHBACK,
            CATEGORY,
            MCC,
            DESCRIPTION,
            ROUNDED_AMOUNT,
        ]
        .into_iter()
        .map(|name| Data::String(name.to_owned()))
        .collect()
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_owned())
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn serial_dates_convert_to_timestamps() {
        let noon = serial_to_datetime(45_667.5).unwrap();
        assert_eq!(noon.to_string(), "2025-01-10 12:00:00");
        let afternoon = serial_to_datetime(44_561.697_222_222_22).unwrap();
        assert_eq!(afternoon.to_string(), "2021-12-31 16:44:00");
        assert!(serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn amount_text_accepts_decimal_comma() {
        assert_eq!(parse_amount_text("-160,89"), Some(-160.89));
        assert_eq!(parse_amount_text("1 500,00"), Some(1500.0));
        assert_eq!(parse_amount_text("  "), Some(0.0));
        assert_eq!(parse_amount_text("abc"), None);
    }

    #[test]
    fn amount_cells() {
        assert_eq!(cell_amount(&Data::Float(-64.0)), Ok(Some(-64.0)));
        assert_eq!(cell_amount(&Data::Int(3000)), Ok(Some(3000.0)));
        assert_eq!(cell_amount(&text("-160,89")), Ok(Some(-160.89)));
        assert_eq!(cell_amount(&Data::Empty), Ok(None));
        assert_eq!(cell_amount(&text(" ")), Ok(None));
        assert!(cell_amount(&Data::Bool(true)).is_err());
        assert!(cell_amount(&text("n/a")).is_err());
    }

    #[test]
    fn code_cells() {
        assert_eq!(cell_code(&Data::Float(5411.0)), Some(5411));
        assert_eq!(cell_code(&Data::Int(4121)), Some(4121));
        assert_eq!(cell_code(&text("5814")), Some(5814));
        assert_eq!(cell_code(&Data::Float(54.5)), None);
        assert_eq!(cell_code(&Data::Empty), None);
    }

    #[test]
    fn date_cells() {
        assert_eq!(
            cell_date(&Data::Float(44_561.5)).unwrap().timestamp().unwrap().to_string(),
            "2021-12-31 12:00:00"
        );
        assert_eq!(
            cell_date(&text("31.12.2021 16:44:00")),
            Some(OperationDate::Text("31.12.2021 16:44:00".to_owned()))
        );
        assert_eq!(
            cell_date(&Data::DateTimeIso("2021-12-31T16:44:00".to_owned()))
                .unwrap()
                .timestamp()
                .unwrap()
                .to_string(),
            "2021-12-31 16:44:00"
        );
        assert_eq!(cell_date(&Data::Error(CellErrorType::Value)), None);
        assert_eq!(cell_date(&Data::Empty), None);
    }

    #[test]
    fn header_must_have_required_columns() {
        assert!(Columns::from_header(&header()).is_ok());
        let partial: Vec<Data> = header()
            .into_iter()
            .filter(|cell| *cell != text(DESCRIPTION))
            .collect();
        let err = Columns::from_header(&partial).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn("Description")));
    }

    #[test]
    fn builds_transaction_from_row() {
        let columns = Columns::from_header(&header()).unwrap();
        let row = vec![
            text("31.12.2021 16:44:00"),
            text("OK"),
            Data::Float(-160.89),
            Data::Empty,
            text("Supermarkets"),
            Data::Float(5411.0),
            text("Kolkhoz"),
            Data::Float(160.89),
        ];
        let tx = columns.transaction(&row, 2).unwrap();
        assert_eq!(tx.category.as_deref(), Some("Supermarkets"));
        assert_eq!(tx.description.as_deref(), Some("Kolkhoz"));
        assert_eq!(tx.status.as_deref(), Some("OK"));
        assert_eq!(tx.operation_amount, -160.89);
        assert_eq!(tx.rounded_amount, 160.89);
        assert_eq!(tx.cashback, None);
        assert_eq!(tx.mcc, Some(5411));
        assert_eq!(tx.payment_amount, 0.0);
        assert!(tx.card_number.is_none());
    }

    #[test]
    fn short_rows_leave_fields_empty() {
        let columns = Columns::from_header(&header()).unwrap();
        let row = vec![text("31.12.2021 16:44:00"), text("OK"), Data::Float(-1.0)];
        let tx = columns.transaction(&row, 3).unwrap();
        assert!(tx.category.is_none());
        assert_eq!(tx.rounded_amount, 0.0);
    }

    #[test]
    fn bad_amount_names_row_and_column() {
        let columns = Columns::from_header(&header()).unwrap();
        let row = vec![text("31.12.2021 16:44:00"), text("OK"), text("lots")];
        let err = columns.transaction(&row, 7).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("row 7"));
        assert!(message.contains("Operation amount"));
    }

    #[test]
    fn blank_rows_are_detected() {
        assert!(is_blank(&[Data::Empty, text("  ")]));
        assert!(!is_blank(&[Data::Empty, Data::Int(0)]));
    }

    #[test]
    fn loads_workbook_rows() {
        let table = load_transactions(&fixture("operations.xlsx")).unwrap();
        assert_eq!(table.len(), 3);
        let rows = table.rows();

        assert_eq!(
            rows[0].operation_date,
            Some(OperationDate::Text("31.12.2021 16:44:00".to_owned()))
        );
        assert_eq!(rows[0].category.as_deref(), Some("Supermarkets"));
        assert_eq!(rows[0].description.as_deref(), Some("Kolkhoz"));
        assert_eq!(rows[0].card_number.as_deref(), Some("*7197"));
        assert_eq!(rows[0].operation_amount, -160.89);
        assert_eq!(rows[0].rounded_amount, 160.89);
        assert_eq!(rows[0].mcc, Some(5411));
        assert_eq!(rows[0].cashback, None);

        let serial = rows[1].operation_date.as_ref().and_then(OperationDate::timestamp);
        assert_eq!(serial.unwrap().to_string(), "2021-12-31 12:00:00");
        assert_eq!(rows[1].category.as_deref(), Some("Fast food"));
        assert_eq!(rows[1].operation_amount, -64.0);
        assert_eq!(rows[1].rounded_amount, 64.0);

        assert_eq!(rows[2].category.as_deref(), Some("Deposits"));
        assert_eq!(rows[2].mcc, None);
        assert!(rows[2].card_number.is_none());
    }

    #[test]
    fn loaded_workbook_normalizes() {
        let table = load_transactions(&fixture("operations.xlsx"))
            .unwrap()
            .normalize_dates()
            .unwrap();
        assert!(table.iter().all(|row| row.operation_time().is_some()));
    }

    #[test]
    fn workbook_errors_count_blank_rows() {
        let err = load_transactions(&fixture("bad_amount.xlsx")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("row 4"), "{message}");
        assert!(message.contains("Operation amount"), "{message}");
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operations.xlsx");
        let err = load_transactions(&path).unwrap_err();
        assert!(matches!(err, ReportError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("operations.xlsx"));
    }

    #[test]
    fn non_workbook_is_spreadsheet_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"definitely not a zip archive").unwrap();
        let err = load_transactions(file.path()).unwrap_err();
        assert!(matches!(err, ReportError::Spreadsheet(_)));
    }
}
