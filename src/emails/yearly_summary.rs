//! Year in review email.

use super::{
    EmailOutcome, Rendered, SIGN_OFF, mailer::Mailer, opted_in_users, send_batch,
    users_with_transactions,
};
use crate::{
    core::{
        money::{format_cents, format_signed_dollars},
        period::year_bounds,
        transaction::get_transactions_for_year,
    },
    entities::{EmailType, TransactionType, user, user_settings},
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::fmt::Write;

/// Categories listed by name in the email.
pub const TOP_CATEGORY_COUNT: usize = 5;

/// Total of one (category, type) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    /// e.g. "Groceries (NEED)"
    pub category: String,
    /// Total in cents
    pub total_cents: i64,
}

/// Year totals in cents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearlySummaryData {
    /// Every (category, type) pair, largest first
    pub totals_by_category: Vec<CategoryTotal>,
    /// Income plus expenses
    pub grand_total: i64,
    /// INCOME transactions
    pub total_income: i64,
    /// Every other transaction
    pub total_expenses: i64,
    /// `total_income - total_expenses`
    pub net_income: i64,
}

/// Opted-in users with a transaction in the current year.
pub async fn get_users_needing_yearly_summary(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<user::Model>> {
    let (start, end) = year_bounds(today.year())?;
    let active = users_with_transactions(db, start, Some(end)).await?;
    Ok(opted_in_users(db, user_settings::Column::YearlySummaryEnabled)
        .await?
        .into_iter()
        .filter(|u| active.contains(&u.id))
        .collect())
}

/// Totals for the year containing `today`.
pub async fn calculate_yearly_totals(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<YearlySummaryData> {
    let transactions = get_transactions_for_year(db, user_id, today.year()).await?;

    let mut by_pair: HashMap<(String, TransactionType), i64> = HashMap::new();
    let (mut total_income, mut total_expenses) = (0, 0);
    for tx in transactions {
        if tx.transaction_type == TransactionType::Income {
            total_income += tx.amount_cents;
        } else {
            total_expenses += tx.amount_cents;
        }
        *by_pair.entry((tx.category, tx.transaction_type)).or_default() += tx.amount_cents;
    }

    let mut totals_by_category: Vec<CategoryTotal> = by_pair
        .into_iter()
        .map(|((category, kind), total_cents)| CategoryTotal {
            category: format!("{category} ({})", kind.name()),
            total_cents,
        })
        .collect();
    totals_by_category.sort_by(|a, b| {
        b.total_cents
            .cmp(&a.total_cents)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(YearlySummaryData {
        totals_by_category,
        grand_total: total_income + total_expenses,
        total_income,
        total_expenses,
        net_income: total_income - total_expenses,
    })
}

/// Subject line, e.g. "Your 2025 Year in Review".
#[must_use]
pub fn build_yearly_summary_subject(today: NaiveDate) -> String {
    format!("Your {} Year in Review", today.year())
}

/// Message body.
#[must_use]
pub fn build_yearly_summary_content(
    user: &user::Model,
    data: &YearlySummaryData,
    today: NaiveDate,
) -> String {
    let year = today.year();
    let mut content = format!(
        "Hello {},\n\nHere's your financial year in review for {year}:\n\n--- ANNUAL OVERVIEW ---\n",
        user.display_name()
    );
    let _ = writeln!(content, "Total Income: ${}", format_cents(data.total_income));
    let _ = writeln!(content, "Total Expenses: ${}", format_cents(data.total_expenses));
    let _ = write!(content, "Net Income: {}\n\n", format_signed_dollars(data.net_income));

    if data.totals_by_category.is_empty() {
        content.push_str("No transactions recorded this year.\n\n");
    } else {
        content.push_str("--- TOP CATEGORIES ---\n");
        for total in data.totals_by_category.iter().take(TOP_CATEGORY_COUNT) {
            let _ = writeln!(content, "{}: ${}", total.category, format_cents(total.total_cents));
        }
        let hidden = data.totals_by_category.len().saturating_sub(TOP_CATEGORY_COUNT);
        if hidden > 0 {
            let _ = writeln!(content, "\n...and {hidden} more categories");
        }
        content.push('\n');
    }

    let _ = write!(content, "Thank you for using Clink Finance throughout {year}!\n\n{SIGN_OFF}");
    content
}

/// Sends the review to every eligible user.
pub async fn send_yearly_summaries(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    today: NaiveDate,
) -> Result<EmailOutcome> {
    let mut messages = Vec::new();
    for user in get_users_needing_yearly_summary(db, today).await? {
        let data = calculate_yearly_totals(db, user.id, today).await?;
        messages.push(Rendered {
            subject: build_yearly_summary_subject(today),
            content: build_yearly_summary_content(&user, &data, today),
            user,
        });
    }
    send_batch(db, mailer, EmailType::YearlySummary, messages).await
}
