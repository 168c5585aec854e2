//! Case-insensitive text search over category and description.

use serde_json::{Map, Value};

use crate::error::{ReportError, Result};
use crate::models::{NOT_SPECIFIED, Transaction};

/// Record key holding the category text.
const CATEGORY_KEY: &str = "Category";
/// Record key holding the description text.
const DESCRIPTION_KEY: &str = "Description";

/// Returns `true` if `needle` (already lower case) occurs in either field.
fn matches(needle: &str, category: &str, description: &str) -> bool {
    category.to_lowercase().contains(needle) || description.to_lowercase().contains(needle)
}

/// Reads a text field of a loose record, with [`NOT_SPECIFIED`] standing in
/// for absent or non-string values.
fn record_text<'rec>(record: &'rec Map<String, Value>, key: &str) -> &'rec str {
    record.get(key).and_then(Value::as_str).unwrap_or(NOT_SPECIFIED)
}

/// Returns the rows whose category or description contains `term`,
/// ignoring case. Order is preserved.
#[inline]
#[must_use]
pub fn search_transactions<'row>(rows: &'row [Transaction], term: &str) -> Vec<&'row Transaction> {
    let needle = term.to_lowercase();
    rows.iter()
        .filter(|row| matches(&needle, row.category_text(), row.description_text()))
        .collect()
}

/// Filters loose JSON records by a search term.
///
/// `rows` must be a JSON array of objects, such as the output of
/// [`crate::models::TransactionTable::to_records`], and `term` a JSON string.
/// A record is kept when the lowercased term occurs in its lowercased
/// `Category` or `Description`; absent or non-string fields read as
/// `"Not specified"`. Matching records are returned unchanged and in order.
///
/// # Errors
///
/// - [`ReportError::MissingArgument`] if `rows` or `term` is `None`.
/// - [`ReportError::WrongType`] if `rows` is not an array of objects or
///   `term` is not a string. Every record is checked before any filtering.
#[inline]
#[tracing::instrument(skip_all)]
pub fn search_records(rows: Option<&Value>, term: Option<&Value>) -> Result<Vec<Value>> {
    let rows_value = rows.ok_or(ReportError::MissingArgument("Transactions not provided"))?;
    let term_value = term.ok_or(ReportError::MissingArgument("Search string not provided"))?;

    let items = rows_value.as_array().ok_or_else(|| {
        ReportError::WrongType("transactions must be a list of records".to_owned())
    })?;
    let term_text = term_value
        .as_str()
        .ok_or_else(|| ReportError::WrongType("search string must be a string".to_owned()))?;
    let records = items
        .iter()
        .map(|item| {
            item.as_object().ok_or_else(|| {
                ReportError::WrongType("every transaction must be a record".to_owned())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let needle = term_text.to_lowercase();
    let found: Vec<Value> = records
        .into_iter()
        .filter(|record| {
            matches(
                &needle,
                record_text(record, CATEGORY_KEY),
                record_text(record, DESCRIPTION_KEY),
            )
        })
        .map(|record| Value::Object(record.clone()))
        .collect();
    tracing::debug!(total = items.len(), found = found.len(), "search finished");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::TransactionTable;
    use crate::test_support::described;

    fn ledger() -> TransactionTable {
        TransactionTable::new(vec![
            described("01.07.2021 10:00:00", "Supermarkets", "Magnit", -120.0, 120.0),
            described("02.07.2021 10:00:00", "Transfers", "Maria K.", -500.0, 500.0),
            described("03.07.2021 10:00:00", "Pharmacy", "Rigla", -80.0, 80.0),
            described("04.07.2021 10:00:00", "Fast food", "Burger King", -300.0, 300.0),
        ])
    }

    fn categories(rows: &[&Transaction]) -> Vec<String> {
        rows.iter().map(|row| row.category_text().to_owned()).collect()
    }

    #[test]
    fn typed_search_matches_category_or_description() {
        let table = ledger();
        let found = search_transactions(table.rows(), "ma");
        assert_eq!(categories(&found), ["Supermarkets", "Transfers", "Pharmacy"]);
    }

    #[test]
    fn search_ignores_case() {
        let table = ledger();
        let lower = search_transactions(table.rows(), "ma");
        let upper = search_transactions(table.rows(), "MA");
        assert_eq!(lower, upper);
    }

    #[test]
    fn empty_term_matches_everything() {
        let table = ledger();
        assert_eq!(search_transactions(table.rows(), "").len(), table.len());
    }

    #[test]
    fn no_match_is_empty_success() {
        let table = ledger();
        assert!(search_transactions(table.rows(), "zzz").is_empty());
    }

    #[test]
    fn absent_fields_read_as_not_specified() {
        let mut row = described("05.07.2021 10:00:00", "Taxi", "Yandex", -90.0, 90.0);
        row.category = None;
        row.description = None;
        let rows = [row];
        assert_eq!(search_transactions(&rows, "not spec").len(), 1);
    }

    #[test]
    fn record_search_keeps_records_unchanged() {
        let table = ledger();
        let records = Value::Array(table.to_records().unwrap());
        let found = search_records(Some(&records), Some(&json!("BURGER"))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Category"], "Fast food");
        assert_eq!(found[0]["Operation amount with rounding"], 300.0);
    }

    #[test]
    fn record_search_treats_non_string_fields_as_not_specified() {
        let records = json!([
            {"Category": null, "Description": 42},
            {"Category": "Taxi", "Description": "Yandex"},
        ]);
        let found = search_records(Some(&records), Some(&json!("specified"))).unwrap();
        assert_eq!(found, [json!({"Category": null, "Description": 42})]);
    }

    #[test]
    fn record_search_requires_both_arguments() {
        let records = json!([]);
        let no_rows = search_records(None, Some(&json!("ma"))).unwrap_err();
        assert_eq!(no_rows.to_string(), "Transactions not provided");
        let no_term = search_records(Some(&records), None).unwrap_err();
        assert_eq!(no_term.to_string(), "Search string not provided");
    }

    #[test]
    fn record_search_rejects_wrong_shapes() {
        let records = json!([{"Category": "Taxi"}]);
        assert!(matches!(
            search_records(Some(&json!("rows")), Some(&json!("ma"))),
            Err(ReportError::WrongType(_))
        ));
        assert!(matches!(
            search_records(Some(&records), Some(&json!(5))),
            Err(ReportError::WrongType(_))
        ));
        assert!(matches!(
            search_records(Some(&json!([{"Category": "Taxi"}, 7])), Some(&json!("zzz"))),
            Err(ReportError::WrongType(_))
        ));
    }
}
