//! Date windows derived from a reference date and a [`Period`].

use chrono::{Datelike as _, Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{ReportError, Result};
use crate::models::{Period, TransactionTable};

/// Format of reference dates supplied by callers.
pub const REFERENCE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Last whole second of a day.
const LAST_SECOND: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Closing second of a day.
const fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(LAST_SECOND)
}

/// Parses a `YYYY-MM-DD` reference date and moves it to 23:59:59 so that
/// operations made later that day still fall inside the window.
///
/// # Errors
///
/// Returns [`ReportError::InvalidDate`] carrying `raw` unchanged.
#[inline]
pub fn parse_reference_date(raw: &str) -> Result<NaiveDateTime> {
    NaiveDate::parse_from_str(raw, REFERENCE_DATE_FORMAT)
        .map(end_of_day)
        .map_err(|_| ReportError::InvalidDate(raw.to_owned()))
}

/// Returns the end of the day containing `now`.
pub(super) const fn reference_from_now(now: NaiveDateTime) -> NaiveDateTime {
    end_of_day(now.date())
}

/// Inclusive time range used to select operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First instant inside the window; `None` means unbounded.
    pub start: Option<NaiveDateTime>,
    /// Last instant inside the window.
    pub end: NaiveDateTime,
}

impl DateWindow {
    /// Builds the window for `period` ending at `end`.
    ///
    /// Returns `None` only when the start falls outside the representable
    /// calendar.
    #[inline]
    #[must_use]
    pub fn for_period(end: NaiveDateTime, period: Period) -> Option<Self> {
        let day = end.date();
        let first_day = match period {
            Period::Week => {
                day.checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_monday())))
            }
            Period::Month => day.with_day(1),
            Period::Year => NaiveDate::from_ymd_opt(day.year(), 1, 1),
            Period::All => return Some(Self { start: None, end }),
        }?;
        Some(Self {
            start: Some(first_day.and_time(NaiveTime::MIN)),
            end,
        })
    }

    /// Returns `true` if `at` lies inside the window, bounds included.
    #[inline]
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at <= self.end && self.start.is_none_or(|start| at >= start)
    }
}

/// Narrows a table to the operations of one period.
///
/// The reference date is parsed first, so a bad date fails before the table
/// is touched. The table's operation dates are then normalized (a no-op if
/// that already happened) and rows outside the window are dropped.
///
/// # Errors
///
/// Returns [`ReportError::InvalidDate`] if `reference_date` is not
/// `YYYY-MM-DD` or a row's date text cannot be parsed.
#[inline]
#[tracing::instrument(skip(table), fields(rows = table.len()))]
pub fn window_by_period(
    table: TransactionTable,
    reference_date: &str,
    period: Period,
) -> Result<TransactionTable> {
    let end = parse_reference_date(reference_date)?;
    let window = DateWindow::for_period(end, period)
        .ok_or_else(|| ReportError::InvalidDate(reference_date.to_owned()))?;
    let windowed = table.normalize_dates()?.within(window.start, window.end);
    tracing::debug!(kept = windowed.len(), "period window applied");
    Ok(windowed)
}
