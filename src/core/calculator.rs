//! Pure calculations over already loaded transactions and budgets.
//!
//! Nothing here touches the database; callers load the rows for a period and
//! pass slices in. Dollar results are exact [`Decimal`] values.

use super::money::cents_to_decimal;
use crate::entities::{BudgetModel, TransactionModel, TransactionType};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;

/// Percentage of a budget spent at which its status becomes `warning`.
pub const BUDGET_WARNING_THRESHOLD: i64 = 80;
/// Percentage of a budget spent at which its status becomes `over_budget`.
pub const BUDGET_DANGER_THRESHOLD: i64 = 100;

/// Sum in dollars of every transaction whose type is in `types`.
#[must_use]
pub fn calculate_total_by_types(
    transactions: &[TransactionModel],
    types: &[TransactionType],
) -> Decimal {
    let cents: i64 = transactions
        .iter()
        .filter(|t| types.contains(&t.transaction_type))
        .map(|t| t.amount_cents)
        .sum();
    cents_to_decimal(cents)
}

/// INCOME total.
#[must_use]
pub fn calculate_total_income(transactions: &[TransactionModel]) -> Decimal {
    calculate_total_by_types(transactions, &[TransactionType::Income])
}

/// NEED + WANT + DEBTS total.
#[must_use]
pub fn calculate_total_spent(transactions: &[TransactionModel]) -> Decimal {
    calculate_total_by_types(transactions, &TransactionType::SPENDING)
}

/// SAVINGS + INVESTING total.
#[must_use]
pub fn calculate_total_saved(transactions: &[TransactionModel]) -> Decimal {
    calculate_total_by_types(transactions, &TransactionType::SAVING)
}

/// One budget compared with what was actually recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLineItem {
    /// Budget id
    pub id: i64,
    /// Category name
    pub category: String,
    /// Planned amount
    pub expected: Decimal,
    /// Recorded amount
    pub actual: Decimal,
    /// `expected - actual`, negative when overspent
    pub remaining: Decimal,
}

impl BudgetLineItem {
    /// Builds a line item from a budget and the cents recorded against it.
    #[must_use]
    pub fn new(budget: &BudgetModel, actual_spent_cents: i64) -> Self {
        let expected = cents_to_decimal(budget.amount_cents);
        let actual = cents_to_decimal(actual_spent_cents);
        Self {
            id: budget.id,
            category: budget.category.clone(),
            expected,
            actual,
            remaining: expected - actual,
        }
    }
}

/// Column totals of a list of line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BudgetTotals {
    /// Sum of expected
    pub expected: Decimal,
    /// Sum of actual
    pub actual: Decimal,
    /// Sum of remaining
    pub remaining: Decimal,
}

/// Cents of the transactions matching the budget's (type, category).
#[must_use]
pub fn calculate_actual_spent_for_budget(
    budget: &BudgetModel,
    transactions: &[TransactionModel],
) -> i64 {
    transactions
        .iter()
        .filter(|t| t.transaction_type == budget.budget_type && t.category == budget.category)
        .map(|t| t.amount_cents)
        .sum()
}

/// Line items for the budgets of one type.
#[must_use]
pub fn create_budget_line_items_for_type(
    transaction_type: TransactionType,
    budgets: &[BudgetModel],
    transactions: &[TransactionModel],
) -> Vec<BudgetLineItem> {
    budgets
        .iter()
        .filter(|b| b.budget_type == transaction_type)
        .map(|b| BudgetLineItem::new(b, calculate_actual_spent_for_budget(b, transactions)))
        .collect()
}

/// Totals of a list of line items.
#[must_use]
pub fn calculate_totals_for_budget_items(items: &[BudgetLineItem]) -> BudgetTotals {
    items.iter().fold(BudgetTotals::default(), |acc, item| BudgetTotals {
        expected: acc.expected + item.expected,
        actual: acc.actual + item.actual,
        remaining: acc.remaining + item.remaining,
    })
}

/// Line items grouped by type label. Every type has an entry, possibly empty.
#[must_use]
pub fn group_budgets_with_actuals(
    budgets: &[BudgetModel],
    transactions: &[TransactionModel],
) -> BTreeMap<&'static str, Vec<BudgetLineItem>> {
    TransactionType::ALL
        .into_iter()
        .map(|t| (t.label(), create_budget_line_items_for_type(t, budgets, transactions)))
        .collect()
}

/// How much of the month's income has been given a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnallocatedIncome {
    /// INCOME transactions of the period
    pub total_income: Decimal,
    /// Non-INCOME budgets of the period
    pub total_allocated: Decimal,
    /// `total_income - total_allocated`
    pub unallocated: Decimal,
    /// Allocated share of income, 0 when there is no income
    pub percent_allocated: f64,
}

/// Compares recorded income with the amounts budgeted for spending and saving.
#[must_use]
pub fn calculate_unallocated_income(
    transactions: &[TransactionModel],
    budgets: &[BudgetModel],
) -> UnallocatedIncome {
    let total_income = calculate_total_income(transactions);
    let allocated_cents: i64 = budgets
        .iter()
        .filter(|b| b.budget_type != TransactionType::Income)
        .map(|b| b.amount_cents)
        .sum();
    let total_allocated = cents_to_decimal(allocated_cents);

    let percent_allocated = if total_income > Decimal::ZERO {
        (total_allocated / total_income * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };

    UnallocatedIncome {
        total_income,
        total_allocated,
        unallocated: total_income - total_allocated,
        percent_allocated,
    }
}

/// Budgeted totals per non-INCOME type label, leaving out zero totals.
#[must_use]
pub fn calculate_budget_distribution(budgets: &[BudgetModel]) -> BTreeMap<&'static str, Decimal> {
    TransactionType::ALL
        .into_iter()
        .filter(|t| t.is_outflow())
        .filter_map(|t| {
            let cents: i64 = budgets
                .iter()
                .filter(|b| b.budget_type == t)
                .map(|b| b.amount_cents)
                .sum();
            (cents > 0).then(|| (t.label(), cents_to_decimal(cents)))
        })
        .collect()
}

/// True when the allocations add up to the income within one cent.
#[must_use]
pub fn validate_zero_based_allocation(allocations: &[Decimal], total_income: Decimal) -> bool {
    let total: Decimal = allocations.iter().map(|a| a.round_dp(2)).sum();
    (total - total_income.round_dp(2)).abs() < Decimal::new(1, 2)
}

/// Budget health for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Under the warning threshold
    OnTrack,
    /// At or over the warning threshold
    Warning,
    /// At or over the full amount
    OverBudget,
    /// Nothing allocated
    Unallocated,
}

impl BudgetStatus {
    /// Status for `spent` out of `available` cents.
    #[must_use]
    pub fn from_amounts(available_cents: i64, spent_cents: i64) -> Self {
        if available_cents <= 0 {
            return Self::Unallocated;
        }
        let percent = spent_cents.saturating_mul(100) / available_cents;
        if percent >= BUDGET_DANGER_THRESHOLD {
            Self::OverBudget
        } else if percent >= BUDGET_WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::OnTrack
        }
    }
}
