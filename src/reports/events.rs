//! The merged events report for one period.

use super::aggregate::{compute_expenses, compute_income};
use super::period::window_by_period;
use crate::error::{ReportError, Result};
use crate::market::MarketData;
use crate::models::{EventsReport, Period, TransactionTable};
use crate::settings::Watchlists;

/// Builds the events report for the period ending at `reference_date`.
///
/// The table is windowed by `period` (month when `None`), then summarized
/// into expenses and income. Rates and prices for the watch-lists come from
/// `market`. All date handling happens before `market` is called.
///
/// # Errors
///
/// - [`ReportError::MissingArgument`] if `reference_date` is `None`.
/// - [`ReportError::InvalidDate`] if it is not `YYYY-MM-DD` or a row's date
///   cannot be parsed.
/// - [`ReportError::EmptyList`] if either watch-list is empty.
/// - Any other error of the `market` lookups.
#[inline]
#[tracing::instrument(skip(table, watchlists, market), fields(rows = table.len()))]
pub fn build_events<M: MarketData + ?Sized>(
    table: TransactionTable,
    reference_date: Option<&str>,
    period: Option<Period>,
    watchlists: &Watchlists,
    market: &M,
) -> Result<EventsReport> {
    let Some(reference) = reference_date else {
        tracing::warn!("reference date not provided");
        return Err(ReportError::MissingArgument("Date not provided"));
    };
    let window = period.unwrap_or_default();

    let windowed = window_by_period(table, reference, window)?;
    let expenses = compute_expenses(&windowed);
    let income = compute_income(&windowed);

    let currency_rates = market.currency_rates(&watchlists.currencies)?;
    let stock_prices = market.stock_prices(&watchlists.stocks)?;

    tracing::info!(
        period = window.code(),
        rates = currency_rates.len(),
        prices = stock_prices.len(),
        "events report built"
    );
    Ok(EventsReport {
        expenses,
        income,
        currency_rates,
        stock_prices,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::market::FixedMarketData;
    use crate::test_support::{described, spent};

    fn ledger() -> TransactionTable {
        TransactionTable::new(vec![
            spent("15.06.2021 10:00:00", "Supermarkets", 999.0),
            spent("01.07.2021 10:00:00", "Supermarkets", 120.0),
            spent("03.07.2021 10:00:00", "Cash", 1000.0),
            described("05.07.2021 12:00:00", "Deposits", "Salary", 50_000.0, 50_000.0),
            spent("30.07.2021 10:00:00", "Taxi", 200.0),
        ])
    }

    fn watchlists() -> Watchlists {
        Watchlists {
            currencies: vec!["USD".to_owned(), "EUR".to_owned()],
            stocks: vec!["AAPL".to_owned()],
        }
    }

    fn market() -> FixedMarketData {
        FixedMarketData::new()
            .with_rate("USD", 73.21)
            .with_rate("EUR", 87.08)
            .with_price("AAPL", 150.12)
    }

    #[test]
    fn merges_all_sections() {
        let market = market();
        let report = build_events(
            ledger(),
            Some("2021-07-07"),
            Some(Period::Month),
            &watchlists(),
            &market,
        )
        .unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "expenses": {
                    "total_amount": 1120,
                    "main": [{"category": "Supermarkets", "amount": 120}],
                    "transfers_and_cash": [{"category": "Cash", "amount": 1000}],
                },
                "income": {
                    "total_amount": 50000,
                    "main": [{"category": "Salary", "amount": 50000}],
                },
                "currency_rates": [
                    {"currency": "USD", "rate": 73.21},
                    {"currency": "EUR", "rate": 87.08},
                ],
                "stock_prices": [{"stock": "AAPL", "price": 150.12}],
            })
        );
        assert_eq!(market.calls(), 2);
    }

    #[test]
    fn period_defaults_to_month() {
        let market = market();
        let lists = watchlists();
        let implicit = build_events(ledger(), Some("2021-07-07"), None, &lists, &market).unwrap();
        let explicit =
            build_events(ledger(), Some("2021-07-07"), Some(Period::Month), &lists, &market)
                .unwrap();
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn all_period_reaches_back() {
        let report = build_events(
            ledger(),
            Some("2021-07-31"),
            Some(Period::All),
            &watchlists(),
            &market(),
        )
        .unwrap();
        assert_eq!(report.expenses.total_amount, 2319);
    }

    #[test]
    fn missing_date_fails_without_lookups() {
        let market = market();
        let err = build_events(ledger(), None, None, &watchlists(), &market).unwrap_err();
        assert!(matches!(err, ReportError::MissingArgument("Date not provided")));
        assert_eq!(market.calls(), 0);
    }

    #[test]
    fn bad_date_fails_without_lookups() {
        let market = market();
        let err =
            build_events(ledger(), Some("07/07/2021"), None, &watchlists(), &market).unwrap_err();
        assert!(matches!(err, ReportError::InvalidDate(_)));
        assert_eq!(market.calls(), 0);
    }

    #[test]
    fn empty_currency_list_fails() {
        let market = market();
        let err = build_events(
            ledger(),
            Some("2021-07-07"),
            None,
            &Watchlists::default(),
            &market,
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::EmptyList("Currency list is empty")));
    }

    #[test]
    fn empty_stock_list_fails() {
        let lists = Watchlists {
            currencies: vec!["USD".to_owned()],
            stocks: Vec::new(),
        };
        let err = build_events(ledger(), Some("2021-07-07"), None, &lists, &market()).unwrap_err();
        assert!(matches!(err, ReportError::EmptyList("Stock list is empty")));
    }

    #[test]
    fn empty_window_yields_zero_totals() {
        let report = build_events(
            ledger(),
            Some("2020-01-10"),
            Some(Period::Week),
            &watchlists(),
            &market(),
        )
        .unwrap();
        assert_eq!(report.expenses.total_amount, 0);
        assert!(report.expenses.main.is_empty());
        assert_eq!(report.income.total_amount, 0);
    }
}
