//! Spending, income and market reports over a bank operations export.
//!
//! The crate loads the operations spreadsheet into a
//! [`models::TransactionTable`] and derives JSON-ready reports from it:
//!
//! - expense and income breakdowns by category ([`reports::compute_expenses`],
//!   [`reports::compute_income`]),
//! - the same narrowed to a week, month or year ([`reports::window_by_period`]),
//! - one category's spend over the last 90 days
//!   ([`reports::expenses_by_category_last_90_days`]),
//! - text search over categories and descriptions ([`reports::search_records`]),
//! - the merged events report with exchange rates and stock closes for the
//!   user's watch-lists ([`reports::build_events`]).
//!
//! Market data is fetched through the [`market::MarketData`] trait; the
//! `blocking` feature provides the HTTP implementation in [`client`].

#[cfg(feature = "blocking")]
pub mod client;
pub mod error;
pub mod loader;
pub mod market;
pub mod models;
pub mod reports;
pub mod settings;

#[cfg(test)]
mod test_support;
