//! Spending of one category over the trailing 90 days.

use chrono::{Days, Local, NaiveDateTime};

use super::period::{parse_reference_date, reference_from_now};
use crate::error::{ReportError, Result};
use crate::models::{CategoryTotal, TransactionTable};

/// Length of the trailing window in days.
pub const LOOKBACK_DAYS: u64 = 90;

/// Capitalizes the first character and lowercases the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Normalizes a user-supplied category to the ledger's label spelling:
/// trimmed, first letter upper case, rest lower case.
#[inline]
#[must_use]
pub fn normalize_category(category: &str) -> String {
    capitalize(category.trim())
}

/// Sums a category's rounded amounts over the 90 days ending at `date`.
///
/// `date` is `YYYY-MM-DD`; when it is absent or blank the current local
/// time is used. See [`expenses_by_category_last_90_days_at`].
///
/// # Errors
///
/// Same as [`expenses_by_category_last_90_days_at`].
#[inline]
pub fn expenses_by_category_last_90_days(
    table: Option<&TransactionTable>,
    category: Option<&str>,
    date: Option<&str>,
) -> Result<Vec<CategoryTotal>> {
    expenses_by_category_last_90_days_at(table, category, date, Local::now().naive_local())
}

/// Sums a category's rounded amounts over the 90 days ending at `date`,
/// using `now` when no date is given.
///
/// The reference moment is moved to 23:59:59 of its day, and the window
/// spans `[reference - 90 days, reference]`, both ends included. The
/// category is matched after [`normalize_category`]. Per-row rounded
/// amounts are summed as they are, without rounding the result.
///
/// Returns an empty list when no row matches, otherwise a single total
/// labelled with the normalized category.
///
/// # Errors
///
/// - [`ReportError::MissingArgument`] if `table` or `category` is `None`.
/// - [`ReportError::InvalidDate`] if `date` is not `YYYY-MM-DD`, or a
///   matching row's date text cannot be parsed.
#[inline]
#[tracing::instrument(skip(table, now))]
pub fn expenses_by_category_last_90_days_at(
    table: Option<&TransactionTable>,
    category: Option<&str>,
    date: Option<&str>,
    now: NaiveDateTime,
) -> Result<Vec<CategoryTotal>> {
    let Some(ledger) = table else {
        tracing::warn!("transactions not provided");
        return Err(ReportError::MissingArgument("Transactions not provided"));
    };
    let Some(requested) = category else {
        tracing::warn!("category not provided");
        return Err(ReportError::MissingArgument("Category not provided"));
    };

    let end = match date.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => parse_reference_date(raw)?,
        None => reference_from_now(now),
    };
    let start = end
        .checked_sub_days(Days::new(LOOKBACK_DAYS))
        .ok_or_else(|| ReportError::InvalidDate(end.to_string()))?;
    let key = normalize_category(requested);

    let mut matched = 0_usize;
    let mut amount = 0.0_f64;
    for row in ledger.iter().filter(|row| row.category.as_deref() == Some(key.as_str())) {
        let Some(at) = row.resolved_time()? else {
            continue;
        };
        if at >= start && at <= end {
            matched = matched.saturating_add(1);
            amount += row.rounded_amount;
        }
    }

    tracing::debug!(category = %key, matched, "category window computed");
    if matched == 0 {
        return Ok(Vec::new());
    }
    Ok(vec![CategoryTotal::new(key, amount)])
}
