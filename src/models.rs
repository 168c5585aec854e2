//! Data models for ledger rows and report results.
//!
//! This module contains the strongly-typed ledger row, the table that
//! holds them, the report result shapes, and enumeration types for
//! constrained parameters.

mod enums;
mod report;
mod table;
mod transaction;

pub use chrono::{NaiveDate, NaiveDateTime};
pub use enums::Period;
pub use report::{
    CategoryTotal, CurrencyRate, EventsReport, ExpensesReport, IncomeReport, StockPrice,
};
pub use table::TransactionTable;
pub use transaction::{NOT_SPECIFIED, OperationDate, Transaction};
