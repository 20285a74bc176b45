//! Shared test utilities for Clink Finance.
//!
//! Helpers set up an in-memory database and create rows with sensible
//! defaults through the same services the application uses.

use crate::{
    core::{auth, budget, category, transaction, transfer},
    entities::{self, CategoryKind, TransactionType},
    errors::Result,
    forms::{transaction::CleanedTransaction, transfer::CleanedTransfer},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Password given to every test user.
pub const TEST_PASSWORD: &str = "password123";

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Calendar date shorthand. Panics on an invalid date, tests only.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a regular user with a settings row.
///
/// # Defaults
/// * email: `{username}@example.com`
/// * password: [`TEST_PASSWORD`]
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    auth::create_user(db, username, &format!("{username}@example.com"), TEST_PASSWORD, false).await
}

/// Creates a transaction without an account.
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_type: TransactionType,
    category: &str,
    amount_cents: i64,
    date_of_expense: NaiveDate,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(
        db,
        user_id,
        CleanedTransaction {
            transaction_type,
            category: category.to_string(),
            amount_cents,
            date_of_expense,
            account_id: None,
        },
    )
    .await
}

/// Creates a budget with no carried-over amount.
#[allow(clippy::too_many_arguments)]
pub async fn create_test_budget(
    db: &DatabaseConnection,
    user_id: i64,
    budget_type: TransactionType,
    category: &str,
    amount_cents: i64,
    year: i32,
    month: u32,
    allow_carry_over: bool,
) -> Result<entities::budget::Model> {
    let slot = budget::BudgetSlot {
        user_id,
        category,
        budget_type,
        year,
        month,
    };
    budget::insert_budget(db, &slot, amount_cents, allow_carry_over, 0).await
}

/// Creates a transfer; `None` as destination records used funds.
pub async fn create_test_transfer(
    db: &DatabaseConnection,
    user_id: i64,
    source_budget_id: i64,
    destination_budget_id: Option<i64>,
    amount_cents: i64,
    transfer_date: NaiveDate,
) -> Result<entities::internal_transfer::Model> {
    transfer::create_transfer(
        db,
        user_id,
        CleanedTransfer {
            source_budget_id,
            destination_budget_id,
            amount_cents,
            transfer_date,
            description: String::new(),
        },
    )
    .await
}

/// Creates a catalog category without a vendor tag.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
    kind: CategoryKind,
) -> Result<entities::category::Model> {
    category::create_category(db, name, kind, None).await
}
