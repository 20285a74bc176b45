//! Current month summary: income, expenses and a per-type breakdown.

use super::{
    EmailOutcome, Rendered, SIGN_OFF, mailer::Mailer, opted_in_users, send_batch,
    users_with_transactions,
};
use crate::{
    core::{
        money::{cents_to_decimal, format_cents, format_signed_dollars},
        period::{month_bounds, month_name},
        transaction::get_transactions_for_month,
    },
    entities::{EmailType, TransactionType, user, user_settings},
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Month totals in cents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlySummaryData {
    /// Every type with activity and its total
    pub totals_by_type: BTreeMap<TransactionType, i64>,
    /// INCOME
    pub income: i64,
    /// SAVINGS
    pub savings: i64,
    /// INVESTING
    pub investing: i64,
    /// NEED
    pub needs: i64,
    /// WANT
    pub wants: i64,
    /// DEBTS
    pub debts: i64,
    /// Every non-income type together
    pub total_expenses: i64,
}

impl MonthlySummaryData {
    /// Income in dollars.
    #[must_use]
    pub fn income_dollars(&self) -> Decimal {
        cents_to_decimal(self.income)
    }

    /// Non-income spending in dollars.
    #[must_use]
    pub fn total_expenses_dollars(&self) -> Decimal {
        cents_to_decimal(self.total_expenses)
    }
}

/// Opted-in users with a transaction in the current month.
pub async fn get_users_needing_monthly_summary(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<user::Model>> {
    let (start, end) = month_bounds(today.year(), today.month())?;
    let active = users_with_transactions(db, start, Some(end)).await?;
    Ok(opted_in_users(db, user_settings::Column::MonthlySummaryEnabled)
        .await?
        .into_iter()
        .filter(|u| active.contains(&u.id))
        .collect())
}

/// Totals per type for the month containing `today`.
pub async fn calculate_monthly_totals(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<MonthlySummaryData> {
    let transactions = get_transactions_for_month(db, user_id, today.year(), today.month()).await?;

    let mut totals_by_type: BTreeMap<TransactionType, i64> = BTreeMap::new();
    for tx in &transactions {
        *totals_by_type.entry(tx.transaction_type).or_default() += tx.amount_cents;
    }
    let total = |t: TransactionType| totals_by_type.get(&t).copied().unwrap_or(0);
    let total_expenses = TransactionType::ALL
        .into_iter()
        .filter(|t| t.is_outflow())
        .map(total)
        .sum();

    Ok(MonthlySummaryData {
        income: total(TransactionType::Income),
        savings: total(TransactionType::Savings),
        investing: total(TransactionType::Investing),
        needs: total(TransactionType::Need),
        wants: total(TransactionType::Want),
        debts: total(TransactionType::Debts),
        total_expenses,
        totals_by_type,
    })
}

/// Subject line, e.g. "Your March Financial Summary".
#[must_use]
pub fn build_monthly_summary_subject(today: NaiveDate) -> String {
    format!("Your {} Financial Summary", month_name(today.month()))
}

/// Message body.
#[must_use]
pub fn build_monthly_summary_content(
    user: &user::Model,
    data: &MonthlySummaryData,
    today: NaiveDate,
) -> String {
    let mut content = format!(
        "Hello {},\n\nHere's your financial summary for {}:\n\n--- INCOME & EXPENSES ---\n",
        user.display_name(),
        month_name(today.month())
    );
    let _ = writeln!(content, "Income: ${}", format_cents(data.income));
    let _ = writeln!(content, "Total Expenses: ${}", format_cents(data.total_expenses));

    if data.income > 0 {
        let _ = write!(
            content,
            "Net: {}\n\n",
            format_signed_dollars(data.income - data.total_expenses)
        );
    } else {
        content.push('\n');
    }

    content.push_str("--- BREAKDOWN BY TYPE ---\n");
    let lines = [
        ("Savings", data.savings),
        ("Investing", data.investing),
        ("Needs", data.needs),
        ("Wants", data.wants),
        ("Debts", data.debts),
    ];
    for (label, cents) in lines {
        if cents > 0 {
            let _ = writeln!(content, "{label}: ${}", format_cents(cents));
        }
    }
    if data.total_expenses == 0 {
        content.push_str("No expenses recorded this month.\n");
    }

    content.push_str("\nGreat work tracking your finances this month!\n\n");
    content.push_str(SIGN_OFF);
    content
}

/// Sends the summary to every eligible user.
pub async fn send_monthly_summaries(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    today: NaiveDate,
) -> Result<EmailOutcome> {
    let mut messages = Vec::new();
    for user in get_users_needing_monthly_summary(db, today).await? {
        let data = calculate_monthly_totals(db, user.id, today).await?;
        messages.push(Rendered {
            subject: build_monthly_summary_subject(today),
            content: build_monthly_summary_content(&user, &data, today),
            user,
        });
    }
    send_batch(db, mailer, EmailType::MonthlySummary, messages).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emails::mailer::OutboxMailer;
    use crate::test_utils::{create_test_transaction, create_test_user, date, setup_test_db};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_monthly_totals() -> Result<()> {
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
            "Groceries",
            20_000,
            date(2025, 3, 5),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Want,
            "Dining",
            10_000,
            date(2025, 3, 6),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency",
            10_000,
            date(2025, 3, 7),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Rent",
            99_999,
            date(2025, 2, 28),
        )
        .await?;

        let data = calculate_monthly_totals(&db, user.id, date(2025, 3, 20)).await?;
        assert_eq!(data.income_dollars(), dec!(5000.0));
        assert_eq!(data.total_expenses_dollars(), dec!(400.0));
        assert_eq!(data.income, 500_000);
        assert_eq!(data.totals_by_type.len(), 4);

        let content = build_monthly_summary_content(&user, &data, date(2025, 3, 20));
        assert!(content.contains("Income: $5000.00\nTotal Expenses: $400.00\nNet: +$4600.00\n\n"));
        assert!(
            content.contains(
                "--- BREAKDOWN BY TYPE ---\nSavings: $100.00\nNeeds: $200.00\nWants: $100.00\n\n",
            )
        );
        assert!(!content.contains("No expenses recorded"));
        Ok(())
    }

    #[test]
    fn test_empty_month_content() {
        let user = user::Model {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            password_hash: String::new(),
            is_superuser: false,
            created_at: chrono::Utc::now(),
        };
        let content = build_monthly_summary_content(
            &user,
            &MonthlySummaryData::default(),
            date(2025, 3, 1),
        );
        assert!(
            content.starts_with("Hello Alice,\n\nHere's your financial summary for March:\n\n")
        );
        assert!(
            content.contains(
                "Total Expenses: $0.00\n\n--- BREAKDOWN BY TYPE ---\nNo expenses recorded this month.\n",
            )
        );
        assert_eq!(build_monthly_summary_subject(date(2025, 3, 1)), "Your March Financial Summary");
    }

    #[tokio::test]
    async fn test_only_users_active_this_month() -> Result<()> {
        let db = setup_test_db().await?;
        let active = create_test_user(&db, "active").await?;
        let stale = create_test_user(&db, "stale").await?;
        create_test_transaction(
            &db,
            active.id,
            TransactionType::Need,
            "Rent",
            100,
            date(2025, 3, 1),
        )
        .await?;
        create_test_transaction(
            &db,
            stale.id,
            TransactionType::Need,
            "Rent",
            100,
            date(2025, 2, 28),
        )
        .await?;
        let mailer = OutboxMailer::new("noreply@test");

        let outcome = send_monthly_summaries(&db, &mailer, date(2025, 3, 31)).await?;
        assert_eq!(outcome.sent, 1);
        assert_eq!(mailer.sent().await[0].subject, "Your March Financial Summary");
        Ok(())
    }
}
