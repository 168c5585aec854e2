//! Row builders shared by unit tests.

use crate::models::{OperationDate, Transaction};

/// Builds an `OK` RUB row with the given date text, category and amounts.
pub(super) fn row(date: &str, category: &str, amount: f64, rounded: f64) -> Transaction {
    Transaction {
        operation_date: Some(OperationDate::Text(date.to_owned())),
        payment_date: date.get(..10).map(str::to_owned),
        card_number: Some("*7197".to_owned()),
        status: Some("OK".to_owned()),
        operation_amount: amount,
        operation_currency: Some("RUB".to_owned()),
        payment_amount: amount,
        payment_currency: Some("RUB".to_owned()),
        cashback: None,
        category: Some(category.to_owned()),
        mcc: Some(5411),
        description: Some("Magnit".to_owned()),
        bonuses: 0.0,
        round_up: 0.0,
        rounded_amount: rounded,
    }
}

/// Same as [`row`] with an explicit description.
pub(super) fn described(
    date: &str,
    category: &str,
    description: &str,
    amount: f64,
    rounded: f64,
) -> Transaction {
    Transaction {
        description: Some(description.to_owned()),
        ..row(date, category, amount, rounded)
    }
}

/// An expense row: negative operation amount, positive rounded amount.
pub(super) fn spent(date: &str, category: &str, rounded: f64) -> Transaction {
    row(date, category, -rounded, rounded)
}
