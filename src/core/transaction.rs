//! Transaction business logic - create, read, update and delete a user's
//! income and expense entries.

use super::period::{month_bounds, year_bounds};
use crate::{
    entities::{Transaction, TransactionType, transaction},
    errors::{Error, Result},
    forms::transaction::CleanedTransaction,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Creates a transaction owned by `user_id`.
pub async fn create_transaction<C>(
    db: &C,
    user_id: i64,
    input: CleanedTransaction,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    if input.amount_cents <= 0 {
        return Err(Error::InvalidAmount {
            amount: input.amount_cents,
        });
    }

    let now = Utc::now();
    let model = transaction::ActiveModel {
        user_id: Set(user_id),
        account_id: Set(input.account_id),
        transaction_type: Set(input.transaction_type),
        category: Set(input.category),
        amount_cents: Set(input.amount_cents),
        date_of_expense: Set(input.date_of_expense),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        user_id,
        transaction_id = model.id,
        kind = model.transaction_type.name(),
        amount_cents = model.amount_cents,
        "Transaction created"
    );
    Ok(model)
}

/// Fetches a transaction only if it belongs to `user_id`.
pub async fn get_user_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<transaction::Model> {
    Transaction::find_by_id(transaction_id)
        .filter(transaction::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Transaction", transaction_id))
}

/// Replaces every editable field of an owned transaction.
pub async fn update_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
    input: CleanedTransaction,
) -> Result<transaction::Model> {
    let existing = get_user_transaction(db, user_id, transaction_id).await?;

    let mut active: transaction::ActiveModel = existing.into();
    active.transaction_type = Set(input.transaction_type);
    active.category = Set(input.category);
    active.amount_cents = Set(input.amount_cents);
    active.date_of_expense = Set(input.date_of_expense);
    active.account_id = Set(input.account_id);
    active.updated_at = Set(Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes an owned transaction.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<()> {
    let existing = get_user_transaction(db, user_id, transaction_id).await?;
    existing.delete(db).await?;
    info!(user_id, transaction_id, "Transaction deleted");
    Ok(())
}

/// All transactions of a user dated within `[start, end]`, newest first.
pub async fn get_transactions_between<C>(
    db: &C,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::DateOfExpense.between(start, end))
        .order_by_desc(transaction::Column::DateOfExpense)
        .order_by_desc(transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All transactions of a user in one calendar month.
pub async fn get_transactions_for_month<C>(
    db: &C,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(year, month)?;
    get_transactions_between(db, user_id, start, end).await
}

/// All transactions of a user in one calendar year.
pub async fn get_transactions_for_year(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
) -> Result<Vec<transaction::Model>> {
    let (start, end) = year_bounds(year)?;
    get_transactions_between(db, user_id, start, end).await
}

/// Cents recorded for one (type, category) in a month.
pub async fn sum_for_slot<C>(
    db: &C,
    user_id: i64,
    transaction_type: TransactionType,
    category: &str,
    year: i32,
    month: u32,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(year, month)?;
    let rows = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::TransactionType.eq(transaction_type))
        .filter(transaction::Column::Category.eq(category))
        .filter(transaction::Column::DateOfExpense.between(start, end))
        .all(db)
        .await?;
    Ok(rows.iter().map(|t| t.amount_cents).sum())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{create_test_transaction, create_test_user, date, setup_test_db};

    #[tokio::test]
    async fn test_create_and_fetch_own_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let created = create_transaction(
            &db,
            user.id,
            CleanedTransaction {
                transaction_type: TransactionType::Need,
                category: "Groceries".to_string(),
                amount_cents: 4567,
                date_of_expense: date(2025, 3, 14),
                account_id: None,
            },
        )
        .await?;

        let fetched = get_user_transaction(&db, user.id, created.id).await?;
        assert_eq!(fetched.amount_cents, 4567);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_transaction_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let tx = create_test_transaction(
            &db,
            alice.id,
            TransactionType::Want,
            "Games",
            100,
            date(2025, 1, 1),
        )
        .await?;

        let result = get_user_transaction(&db, bob.id, tx.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Transaction", .. })));

        let result = delete_transaction(&db, bob.id, tx.id).await;
        assert!(result.is_err());
        assert!(get_user_transaction(&db, alice.id, tx.id).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let tx = create_test_transaction(
            &db,
            user.id,
            TransactionType::Want,
            "Games",
            100,
            date(2025, 1, 1),
        )
        .await?;

        let updated = update_transaction(
            &db,
            user.id,
            tx.id,
            CleanedTransaction {
                transaction_type: TransactionType::Need,
                category: "Rent".to_string(),
                amount_cents: 120_000,
                date_of_expense: date(2025, 1, 2),
                account_id: None,
            },
        )
        .await?;
        assert_eq!(updated.category, "Rent");
        assert_eq!(updated.transaction_type, TransactionType::Need);

        delete_transaction(&db, user.id, tx.id).await?;
        assert!(get_user_transaction(&db, user.id, tx.id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_month_and_slot_queries() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            1000,
            date(2025, 1, 31),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            2000,
            date(2025, 2, 1),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Want,
            "Food",
            4000,
            date(2025, 2, 15),
        )
        .await?;

        assert_eq!(get_transactions_for_month(&db, user.id, 2025, 2).await?.len(), 2);
        assert_eq!(
            sum_for_slot(&db, user.id, TransactionType::Need, "Food", 2025, 2).await?,
            2000
        );
        assert_eq!(get_transactions_for_year(&db, user.id, 2025).await?.len(), 3);
        Ok(())
    }
}
