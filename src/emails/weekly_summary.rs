//! Seven-day spending summary with the current month's budget status.

use super::{
    EmailOutcome, Rendered, SIGN_OFF, mailer::Mailer, opted_in_users, send_batch,
    users_with_transactions,
};
use crate::{
    core::{
        budget::get_budgets_for_month,
        money::format_cents,
        transaction::get_transactions_for_month,
    },
    entities::{EmailType, Transaction, transaction, user, user_settings},
    errors::Result,
};
use chrono::{Datelike, Days, NaiveDate};
use sea_orm::prelude::*;
use std::collections::HashMap;
use std::fmt::Write;

/// Cents recorded under one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    /// Category name
    pub category: String,
    /// Total in cents
    pub total_cents: i64,
}

/// A current-month budget compared with its spending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetRemaining {
    /// Category name
    pub category: String,
    /// Amount plus carry-over, in cents
    pub budget_cents: i64,
    /// Spent this month, in cents
    pub spent_cents: i64,
    /// `budget - spent`, negative when over budget
    pub remaining_cents: i64,
}

/// Figures for one weekly summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySummaryData {
    /// Last seven days per category, largest first
    pub totals_by_category: Vec<CategoryTotal>,
    /// Current month budgets, tightest first
    pub remaining_budgets: Vec<BudgetRemaining>,
    /// Sum of `totals_by_category`
    pub grand_total_cents: i64,
}

/// Opted-in users with a transaction dated within the last seven days.
pub async fn get_users_needing_weekly_summary(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<user::Model>> {
    let since = today - Days::new(7);
    let active = users_with_transactions(db, since, None).await?;
    Ok(opted_in_users(db, user_settings::Column::WeeklySummaryEnabled)
        .await?
        .into_iter()
        .filter(|u| active.contains(&u.id))
        .collect())
}

/// Budgets of the current month with what has been spent against them.
pub async fn calculate_remaining_budgets(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<Vec<BudgetRemaining>> {
    let budgets = get_budgets_for_month(db, user_id, today.year(), today.month()).await?;
    let transactions = get_transactions_for_month(db, user_id, today.year(), today.month()).await?;

    let mut remaining: Vec<BudgetRemaining> = budgets
        .into_iter()
        .map(|budget| {
            let spent_cents = transactions
                .iter()
                .filter(|t| {
                    t.transaction_type == budget.budget_type && t.category == budget.category
                })
                .map(|t| t.amount_cents)
                .sum();
            let budget_cents = budget.amount_cents + budget.carried_over_cents;
            BudgetRemaining {
                category: budget.category,
                budget_cents,
                spent_cents,
                remaining_cents: budget_cents - spent_cents,
            }
        })
        .collect();
    remaining.sort_by_key(|b| b.remaining_cents);
    Ok(remaining)
}

/// Category totals of the last seven days and the month's budget status.
pub async fn calculate_weekly_totals(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<WeeklySummaryData> {
    let since = today - Days::new(7);
    let transactions = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::DateOfExpense.gte(since))
        .all(db)
        .await?;

    let mut by_category: HashMap<String, i64> = HashMap::new();
    for tx in transactions {
        *by_category.entry(tx.category).or_default() += tx.amount_cents;
    }
    let mut totals_by_category: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, total_cents)| CategoryTotal { category, total_cents })
        .collect();
    totals_by_category.sort_by(|a, b| {
        b.total_cents
            .cmp(&a.total_cents)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(WeeklySummaryData {
        grand_total_cents: totals_by_category.iter().map(|c| c.total_cents).sum(),
        totals_by_category,
        remaining_budgets: calculate_remaining_budgets(db, user_id, today).await?,
    })
}

/// Subject line.
#[must_use]
pub fn build_weekly_summary_subject() -> String {
    "Your Weekly Spending Summary".to_string()
}

/// Message body.
#[must_use]
pub fn build_weekly_summary_content(user: &user::Model, data: &WeeklySummaryData) -> String {
    let mut content = format!(
        "Hello {},\n\nHere's a summary of your spending over the past 7 days:\n\n--- SPENDING BY CATEGORY ---\n",
        user.display_name()
    );

    if data.totals_by_category.is_empty() {
        content.push_str("No expenses recorded this week.\n\n");
    } else {
        for total in &data.totals_by_category {
            let _ = writeln!(content, "{}: ${}", total.category, format_cents(total.total_cents));
        }
        let _ = write!(content, "\nTotal Spent: ${}\n\n", format_cents(data.grand_total_cents));
    }

    if !data.remaining_budgets.is_empty() {
        content.push_str("--- BUDGET STATUS ---\n");
        for budget in &data.remaining_budgets {
            let _ = write!(
                content,
                "{}: ${} / ${} ",
                budget.category,
                format_cents(budget.spent_cents),
                format_cents(budget.budget_cents)
            );
            if budget.remaining_cents >= 0 {
                let _ = writeln!(content, "(${} remaining)", format_cents(budget.remaining_cents));
            } else {
                let _ = writeln!(
                    content,
                    "(${} over budget)",
                    format_cents(-budget.remaining_cents)
                );
            }
        }
        content.push('\n');
    }

    content.push_str("Keep up the great work tracking your finances!\n\n");
    content.push_str(SIGN_OFF);
    content
}

/// Sends the summary to every eligible user.
pub async fn send_weekly_summaries(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    today: NaiveDate,
) -> Result<EmailOutcome> {
    let mut messages = Vec::new();
    for user in get_users_needing_weekly_summary(db, today).await? {
        let data = calculate_weekly_totals(db, user.id, today).await?;
        messages.push(Rendered {
            subject: build_weekly_summary_subject(),
            content: build_weekly_summary_content(&user, &data),
            user,
        });
    }
    send_batch(db, mailer, EmailType::WeeklySummary, messages).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emails::mailer::OutboxMailer;
    use crate::entities::TransactionType;
    use crate::test_utils::{
        create_test_budget, create_test_transaction, create_test_user, date, setup_test_db,
    };

    #[tokio::test]
    async fn test_weekly_totals_and_budget_status() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Groceries",
            20_000,
            2025,
            3,
            false,
        )
        .await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Want,
            "Dining",
            5_000,
            2025,
            3,
            false,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Groceries",
            4_000,
            date(2025, 3, 2),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Groceries",
            3_000,
            date(2025, 3, 12),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Want,
            "Dining",
            6_500,
            date(2025, 3, 13),
        )
        .await?;

        let data = calculate_weekly_totals(&db, user.id, date(2025, 3, 15)).await?;
        assert_eq!(data.totals_by_category[0].category, "Dining");
        assert_eq!(data.totals_by_category[1].total_cents, 3_000);
        assert_eq!(data.grand_total_cents, 9_500);

        assert_eq!(data.remaining_budgets[0].category, "Dining");
        assert_eq!(data.remaining_budgets[0].remaining_cents, -1_500);
        assert_eq!(data.remaining_budgets[1].spent_cents, 7_000);

        let content = build_weekly_summary_content(&user, &data);
        assert!(content.contains("Dining: $65.00\nGroceries: $30.00\n\nTotal Spent: $95.00\n\n"));
        assert!(content.contains("Dining: $65.00 / $50.00 ($15.00 over budget)\n"));
        assert!(content.contains("Groceries: $70.00 / $200.00 ($130.00 remaining)\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_users_get_no_summary() -> Result<()> {
        let db = setup_test_db().await?;
        let active = create_test_user(&db, "active").await?;
        create_test_user(&db, "idle").await?;
        create_test_transaction(
            &db,
            active.id,
            TransactionType::Need,
            "Rent",
            100,
            date(2025, 3, 14),
        )
        .await?;
        let mailer = OutboxMailer::new("noreply@test");

        let outcome = send_weekly_summaries(&db, &mailer, date(2025, 3, 15)).await?;
        assert_eq!(outcome, EmailOutcome { sent: 1, failed: 0 });
        assert_eq!(mailer.sent().await[0].to, "active@example.com");
        Ok(())
    }
}
