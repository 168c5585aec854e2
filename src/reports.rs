//! Reports computed over a transaction table.
//!
//! - [`compute_expenses`] / [`compute_income`]: category breakdowns.
//! - [`window_by_period`]: narrows a table to a week, month, year or
//!   everything up to a date.
//! - [`expenses_by_category_last_90_days`]: one category's trailing spend.
//! - [`search_transactions`] / [`search_records`]: text search.
//! - [`build_events`]: the merged report with market data.

mod aggregate;
mod category_window;
mod events;
mod period;
mod search;

pub use aggregate::{
    CASH, DEPOSITS, OTHER, TOP_CATEGORIES, TRANSFERS, compute_expenses, compute_income,
};
pub use category_window::{
    LOOKBACK_DAYS, expenses_by_category_last_90_days, expenses_by_category_last_90_days_at,
    normalize_category,
};
pub use events::build_events;
pub use period::{DateWindow, REFERENCE_DATE_FORMAT, parse_reference_date, window_by_period};
pub use search::{search_records, search_transactions};
