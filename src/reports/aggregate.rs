//! Category aggregation: expense and income breakdowns.

use std::collections::{HashMap, HashSet};

use crate::models::{CategoryTotal, ExpensesReport, IncomeReport, Transaction, TransactionTable};

/// Cash withdrawals, reported apart from regular spending.
pub const CASH: &str = "Cash";
/// Transfers to other people or accounts, reported apart from regular spending.
pub const TRANSFERS: &str = "Transfers";
/// Category marking incoming funds.
pub const DEPOSITS: &str = "Deposits";
/// Bucket collecting expense categories beyond the top ones.
pub const OTHER: &str = "Other";
/// Number of expense categories listed before the rest fold into [`OTHER`].
pub const TOP_CATEGORIES: usize = 7;

/// Returns `true` for the two categories kept out of the expense ranking.
fn is_cash_or_transfer(category: &str) -> bool {
    category == CASH || category == TRANSFERS
}

/// Rounds a sum to whole currency units.
///
/// Uses [`f64::round`], which rounds halves away from zero. Runtimes that
/// round half to even disagree on sums ending in exactly `.5`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "ledger sums are far below i64::MAX and the value is already integral"
)]
const fn round_units(sum: f64) -> i64 {
    sum.round() as i64
}

/// Sums the pre-rounded amounts of the given rows.
fn rounded_sum<'row, I>(rows: I) -> f64
where
    I: IntoIterator<Item = &'row Transaction>,
{
    rows.into_iter().map(|row| row.rounded_amount).sum()
}

/// Groups rows by `key`, sums and rounds each group, largest first.
///
/// Groups are ordered by label before the stable descending sort, so equal
/// sums always come out in alphabetical order.
fn group_totals<'row, I, F>(rows: I, key: F) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'row Transaction>,
    F: Fn(&'row Transaction) -> &'row str,
{
    let mut sums: HashMap<&str, f64> = HashMap::new();
    for row in rows {
        *sums.entry(key(row)).or_default() += row.rounded_amount;
    }
    let mut totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(label, sum)| CategoryTotal::new(label, sum.round()))
        .collect();
    totals.sort_by(|a, b| a.category.cmp(&b.category));
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    totals
}

/// Keeps the top [`TOP_CATEGORIES`] totals and folds the rest into
/// [`OTHER`] when their sum is positive.
fn fold_overflow(mut totals: Vec<CategoryTotal>) -> Vec<CategoryTotal> {
    if totals.len() <= TOP_CATEGORIES {
        return totals;
    }
    let rest = totals.split_off(TOP_CATEGORIES);
    let overflow: f64 = rest.iter().map(|total| total.amount).sum();
    if overflow > 0.0_f64 {
        totals.push(CategoryTotal::new(OTHER, overflow));
    }
    totals
}

/// Builds the spending breakdown of a table.
///
/// A category counts as an expense category when at least one of its rows
/// has a negative operation amount; every row of such a category is then
/// summed. [`CASH`] and [`TRANSFERS`] rows are always reported separately
/// regardless of sign, and rows without a category are ignored.
///
/// `total_amount` is the rounded expense sum plus the rounded cash and
/// transfer sum.
#[inline]
#[must_use]
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn compute_expenses(table: &TransactionTable) -> ExpensesReport {
    let expense_categories: HashSet<&str> = table
        .iter()
        .filter(|row| row.operation_amount < 0.0_f64)
        .filter_map(|row| row.category.as_deref())
        .filter(|category| !is_cash_or_transfer(category))
        .collect();

    let expenses: Vec<&Transaction> = table
        .iter()
        .filter(|row| {
            row.category
                .as_deref()
                .is_some_and(|category| expense_categories.contains(category))
        })
        .collect();
    let cash_and_transfers: Vec<&Transaction> = table
        .iter()
        .filter(|row| row.category.as_deref().is_some_and(is_cash_or_transfer))
        .collect();

    let total_amount = round_units(rounded_sum(expenses.iter().copied()))
        .saturating_add(round_units(rounded_sum(cash_and_transfers.iter().copied())));

    let main = if expenses.is_empty() {
        tracing::info!("no expense categories found");
        Vec::new()
    } else {
        fold_overflow(group_totals(expenses, Transaction::category_text))
    };

    let transfers_and_cash = if cash_and_transfers.is_empty() {
        tracing::info!("no cash or transfers found");
        Vec::new()
    } else {
        group_totals(cash_and_transfers, Transaction::category_text)
    };

    ExpensesReport {
        total_amount,
        main,
        transfers_and_cash,
    }
}

/// Builds the income breakdown of a table.
///
/// Only [`DEPOSITS`] rows count. They are grouped by description, since
/// the description names the source of the money, and no entry is folded
/// away. Deposits without a description add to `total_amount` but get no
/// entry in `main`.
#[inline]
#[must_use]
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn compute_income(table: &TransactionTable) -> IncomeReport {
    let income: Vec<&Transaction> = table
        .iter()
        .filter(|row| row.category.as_deref() == Some(DEPOSITS))
        .collect();

    let total_amount = round_units(rounded_sum(income.iter().copied()));
    let main = if income.is_empty() {
        tracing::info!("no income found");
        Vec::new()
    } else {
        group_totals(
            income.into_iter().filter(|row| row.description.is_some()),
            Transaction::description_text,
        )
    };

    IncomeReport { total_amount, main }
}
