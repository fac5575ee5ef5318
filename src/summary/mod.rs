//! Summary Aggregator
//!
//! Pure reduction of per-type aggregate totals into the overall summary
//! shape. No store access, no side effects; missing totals collapse to
//! zero so an empty table summarizes cleanly instead of erroring.

use rust_decimal::Decimal;
use serde::Serialize;

/// Per-type totals as produced by the store's grouped aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeTotals {
    pub income: Option<Decimal>,
    pub expense: Option<Decimal>,
}

/// Overall summary returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
}

/// Reduce aggregate totals to `{total_income, total_expense, balance}`.
/// Balance may be negative.
pub fn summarize(totals: TypeTotals) -> Summary {
    let total_income = totals.income.unwrap_or(Decimal::ZERO);
    let total_expense = totals.expense.unwrap_or(Decimal::ZERO);

    Summary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}
