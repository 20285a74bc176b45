//! Year in review - month by month totals per type and per category.

use super::budget::get_budgets_for_year;
use super::money::cents_to_decimal;
use super::transaction::get_transactions_for_year;
use crate::{
    entities::{BudgetModel, TransactionModel, TransactionType},
    errors::Result,
};
use chrono::Datelike;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeSet;

/// Twelve monthly totals, January first.
pub type MonthlyTotals = [Decimal; 12];

/// One type's row: twelve months, the year total, then the average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeBreakdownRow {
    /// Transaction type
    pub transaction_type: TransactionType,
    /// Display label
    pub label: &'static str,
    /// Fourteen values as built by [`add_totals_and_average`]
    pub values: Vec<Decimal>,
}

/// One category's year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    /// Category name
    pub category: String,
    /// Monthly totals
    pub months: MonthlyTotals,
    /// Year total
    pub total: Decimal,
    /// Average over months with activity
    pub average: Decimal,
}

/// Categories of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdownGroup {
    /// Transaction type
    pub transaction_type: TransactionType,
    /// Display label
    pub label: &'static str,
    /// Rows ordered by category name
    pub categories: Vec<CategoryBreakdown>,
}

/// Everything the year review page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearReview {
    /// Reviewed year
    pub year: i32,
    /// Link target for the previous year
    pub prev_year: i32,
    /// Link target for the next year
    pub next_year: i32,
    /// One row per type, in display order
    pub type_breakdown: Vec<TypeBreakdownRow>,
    /// Per category rows for every non-income type
    pub category_breakdowns: Vec<CategoryBreakdownGroup>,
    /// Whether the year has any budget or transaction
    pub has_data: bool,
}

/// Monthly totals of one type, optionally narrowed to one category.
#[must_use]
pub fn calculate_monthly_totals_for_transactions(
    transactions: &[TransactionModel],
    transaction_type: TransactionType,
    category: Option<&str>,
) -> MonthlyTotals {
    let mut cents = [0_i64; 12];
    for tx in transactions {
        if tx.transaction_type != transaction_type {
            continue;
        }
        if category.is_some_and(|c| c != tx.category) {
            continue;
        }
        cents[tx.date_of_expense.month0() as usize] += tx.amount_cents;
    }
    cents.map(cents_to_decimal)
}

fn total_and_average(months: &MonthlyTotals) -> (Decimal, Decimal) {
    let total: Decimal = months.iter().sum();
    let active = months.iter().filter(|m| **m > Decimal::ZERO).count();
    let average = if active > 0 {
        total / Decimal::from(active)
    } else {
        Decimal::ZERO
    };
    (total, average)
}

/// Appends the year total and the average over non-zero months.
#[must_use]
pub fn add_totals_and_average(months: &MonthlyTotals) -> Vec<Decimal> {
    let (total, average) = total_and_average(months);
    let mut values = months.to_vec();
    values.push(total);
    values.push(average);
    values
}

/// One [`TypeBreakdownRow`] per transaction type.
#[must_use]
pub fn aggregate_by_month_and_type(transactions: &[TransactionModel]) -> Vec<TypeBreakdownRow> {
    TransactionType::ALL
        .into_iter()
        .map(|transaction_type| TypeBreakdownRow {
            transaction_type,
            label: transaction_type.label(),
            values: add_totals_and_average(&calculate_monthly_totals_for_transactions(
                transactions,
                transaction_type,
                None,
            )),
        })
        .collect()
}

/// Per category totals for one type. Categories come from both budgets and
/// transactions, so a budgeted category without spending shows as zeros.
#[must_use]
pub fn aggregate_by_category_and_month(
    budgets: &[BudgetModel],
    transactions: &[TransactionModel],
    transaction_type: TransactionType,
) -> Vec<CategoryBreakdown> {
    let categories: BTreeSet<&str> = budgets
        .iter()
        .filter(|b| b.budget_type == transaction_type)
        .map(|b| b.category.as_str())
        .chain(
            transactions
                .iter()
                .filter(|t| t.transaction_type == transaction_type)
                .map(|t| t.category.as_str()),
        )
        .collect();

    categories
        .into_iter()
        .map(|category| {
            let months = calculate_monthly_totals_for_transactions(
                transactions,
                transaction_type,
                Some(category),
            );
            let (total, average) = total_and_average(&months);
            CategoryBreakdown {
                category: category.to_string(),
                months,
                total,
                average,
            }
        })
        .collect()
}

/// Builds the year review for a user.
pub async fn build_year_review(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
) -> Result<YearReview> {
    let budgets = get_budgets_for_year(db, user_id, year).await?;
    let transactions = get_transactions_for_year(db, user_id, year).await?;

    let category_breakdowns = TransactionType::ALL
        .into_iter()
        .filter(|t| t.is_outflow())
        .map(|transaction_type| CategoryBreakdownGroup {
            transaction_type,
            label: transaction_type.label(),
            categories: aggregate_by_category_and_month(&budgets, &transactions, transaction_type),
        })
        .collect();

    Ok(YearReview {
        year,
        prev_year: year - 1,
        next_year: year + 1,
        type_breakdown: aggregate_by_month_and_type(&transactions),
        category_breakdowns,
        has_data: !budgets.is_empty() || !transactions.is_empty(),
    })
}
