//! Month dashboards: the home page and the income/expense summary shown above
//! the transaction list.

use super::budget::get_budgets_for_month;
use super::calculator::{
    BudgetLineItem, BudgetTotals, UnallocatedIncome, calculate_budget_distribution,
    calculate_total_income, calculate_total_saved, calculate_total_spent,
    calculate_totals_for_budget_items, calculate_unallocated_income, group_budgets_with_actuals,
};
use super::carry_over::{CarryOverResult, process_month_end_carry_over};
use super::money::cents_to_decimal;
use super::period::{format_month_year, next_month, previous_month, validate_period};
use super::transaction::get_transactions_for_month;
use crate::{
    entities::{TransactionModel, TransactionType},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Income and expenses of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyDashboard {
    /// INCOME transactions, newest first
    pub monthly_income: Vec<TransactionModel>,
    /// Every other transaction, newest first
    pub monthly_expenses: Vec<TransactionModel>,
    /// Sum of income
    pub total_income: Decimal,
    /// Sum of expenses
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`
    pub net_income: Decimal,
    /// e.g. "March 2025"
    pub current_month: String,
}

fn sum(transactions: &[TransactionModel]) -> Decimal {
    cents_to_decimal(transactions.iter().map(|t| t.amount_cents).sum())
}

/// Splits a month's transactions into income and expenses and totals them.
pub async fn get_months_dashboard(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<MonthlyDashboard> {
    let (monthly_income, monthly_expenses): (Vec<_>, Vec<_>) =
        get_transactions_for_month(db, user_id, year, month)
            .await?
            .into_iter()
            .partition(|t| t.transaction_type == TransactionType::Income);

    let total_income = sum(&monthly_income);
    let total_expenses = sum(&monthly_expenses);
    Ok(MonthlyDashboard {
        total_income,
        total_expenses,
        net_income: total_income - total_expenses,
        current_month: format_month_year(year, month),
        monthly_income,
        monthly_expenses,
    })
}

/// A month reference used for navigation links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthLink {
    /// Year
    pub year: i32,
    /// Month 1-12
    pub month: u32,
}

impl From<(i32, u32)> for MonthLink {
    fn from((year, month): (i32, u32)) -> Self {
        Self { year, month }
    }
}

/// Everything the home page shows for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeContext {
    /// Year shown
    pub year: i32,
    /// Month shown
    pub month: u32,
    /// e.g. "March 2025"
    pub month_label: String,
    /// Previous month link
    pub prev: MonthLink,
    /// Next month link
    pub next: MonthLink,
    /// INCOME transactions
    pub total_income: Decimal,
    /// NEED + WANT + DEBTS transactions
    pub total_spent: Decimal,
    /// SAVINGS + INVESTING transactions
    pub total_saved: Decimal,
    /// Budget line items per type label
    pub budget_data: BTreeMap<&'static str, Vec<BudgetLineItem>>,
    /// Column totals per type label
    pub budget_totals: BTreeMap<&'static str, BudgetTotals>,
    /// Income not yet budgeted
    pub unallocated: UnallocatedIncome,
    /// Budgeted amount per outflow type
    pub distribution: BTreeMap<&'static str, Decimal>,
    /// Carry-over run for the month before
    pub carry_over: CarryOverResult,
}

/// Builds the home page. The previous month is closed out first so this
/// month's budgets already hold their carry-over.
pub async fn build_home_context(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<HomeContext> {
    validate_period(year, month)?;
    let (prev_year, prev) = previous_month(year, month);
    let carry_over = process_month_end_carry_over(db, user_id, prev_year, prev).await?;
    debug!(user_id, year, month, processed = carry_over.processed, "Previous month closed out");

    let budgets = get_budgets_for_month(db, user_id, year, month).await?;
    let transactions = get_transactions_for_month(db, user_id, year, month).await?;

    let budget_data = group_budgets_with_actuals(&budgets, &transactions);
    let budget_totals = budget_data
        .iter()
        .map(|(label, items)| (*label, calculate_totals_for_budget_items(items)))
        .collect();

    Ok(HomeContext {
        year,
        month,
        month_label: format_month_year(year, month),
        prev: (prev_year, prev).into(),
        next: next_month(year, month).into(),
        total_income: calculate_total_income(&transactions),
        total_spent: calculate_total_spent(&transactions),
        total_saved: calculate_total_saved(&transactions),
        budget_data,
        budget_totals,
        unallocated: calculate_unallocated_income(&transactions, &budgets),
        distribution: calculate_budget_distribution(&budgets),
        carry_over,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        create_test_budget, create_test_transaction, create_test_user, date, setup_test_db,
    };
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_months_dashboard_splits_income_and_expenses() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Income,
            "Salary",
            500_000,
            date(2025, 3, 1),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Rent",
            120_000,
            date(2025, 3, 2),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency",
            30_000,
            date(2025, 3, 9),
        )
        .await?;

        let dashboard = get_months_dashboard(&db, user.id, 2025, 3).await?;
        assert_eq!(dashboard.monthly_income.len(), 1);
        assert_eq!(dashboard.monthly_expenses.len(), 2);
        assert_eq!(dashboard.total_income, dec!(5000));
        assert_eq!(dashboard.total_expenses, dec!(1500));
        assert_eq!(dashboard.net_income, dec!(3500));
        assert_eq!(dashboard.current_month, "March 2025");
        Ok(())
    }

    #[tokio::test]
    async fn test_home_context_runs_previous_carry_over() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Income,
            "Salary",
            400_000,
            date(2025, 2, 1),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency",
            25_000,
            date(2025, 2, 3),
        )
        .await?;

        let home = build_home_context(&db, user.id, 2025, 2).await?;
        assert_eq!(home.carry_over.created, 1);
        assert_eq!(home.prev, MonthLink { year: 2025, month: 1 });
        assert_eq!(home.next, MonthLink { year: 2025, month: 3 });

        let savings = &home.budget_data["Savings"];
        assert_eq!(savings.len(), 1);
        assert_eq!(savings[0].actual, dec!(250));
        assert_eq!(home.budget_totals["Savings"].remaining, dec!(750));
        assert!(home.budget_data["Need"].is_empty());

        assert_eq!(home.total_income, dec!(4000));
        assert_eq!(home.total_saved, dec!(250));
        assert_eq!(home.unallocated.total_allocated, dec!(1000));
        assert_eq!(home.distribution.len(), 1);
        Ok(())
    }
}
