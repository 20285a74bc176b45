//! Accounts and their balance history.
//!
//! A balance snapshot is recorded whenever the user reports a new balance. The
//! current balance of an account is its newest snapshot, or the starting
//! balance when no snapshot exists.

use super::money::cents_to_dollars;
use crate::{
    entities::{Account, AccountBalance, account, account_balance},
    errors::{Error, Result},
    forms::account::CleanedAccount,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::info;

/// Current balance of one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentAccountBalance {
    /// Account id
    pub account_id: i64,
    /// Account name
    pub account: String,
    /// Balance in dollars
    pub balance: f64,
}

/// Creates an account and its first balance snapshot.
pub async fn create_account(
    db: &DatabaseConnection,
    owner_id: i64,
    input: CleanedAccount,
) -> Result<account::Model> {
    let txn = db.begin().await?;
    let now = Utc::now();
    let account = account::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(input.name),
        starting_balance_cents: Set(input.starting_balance_cents),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_snapshot(&txn, account.id, account.starting_balance_cents).await?;
    txn.commit().await?;

    info!(owner_id, account_id = account.id, name = %account.name, "Account created");
    Ok(account)
}

async fn insert_snapshot<C>(
    db: &C,
    account_id: i64,
    balance_cents: i64,
) -> Result<account_balance::Model>
where
    C: ConnectionTrait,
{
    account_balance::ActiveModel {
        account_id: Set(account_id),
        balance_cents: Set(balance_cents),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Fetches an account only if `owner_id` owns it.
pub async fn get_user_account(
    db: &DatabaseConnection,
    owner_id: i64,
    account_id: i64,
) -> Result<account::Model> {
    Account::find_by_id(account_id)
        .filter(account::Column::OwnerId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Account", account_id))
}

/// Records a new balance for an owned account.
pub async fn record_balance(
    db: &DatabaseConnection,
    owner_id: i64,
    account_id: i64,
    balance_cents: i64,
) -> Result<account_balance::Model> {
    let account = get_user_account(db, owner_id, account_id).await?;
    let snapshot = insert_snapshot(db, account.id, balance_cents).await?;
    info!(owner_id, account_id, balance_cents, "Account balance recorded");
    Ok(snapshot)
}

/// The user's accounts ordered by name.
pub async fn list_accounts(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<account::Model>> {
    Account::find()
        .filter(account::Column::OwnerId.eq(owner_id))
        .order_by_asc(account::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Newest balance of an account in cents.
pub async fn get_latest_balance(db: &DatabaseConnection, account: &account::Model) -> Result<i64> {
    let latest = AccountBalance::find()
        .filter(account_balance::Column::AccountId.eq(account.id))
        .order_by_desc(account_balance::Column::CreatedAt)
        .order_by_desc(account_balance::Column::Id)
        .one(db)
        .await?;
    Ok(latest.map_or(account.starting_balance_cents, |s| s.balance_cents))
}

/// Current balance of every account the user owns.
pub async fn get_latest_user_account_balances(
    db: &DatabaseConnection,
    owner_id: i64,
) -> Result<Vec<CurrentAccountBalance>> {
    let mut balances = Vec::new();
    for account in list_accounts(db, owner_id).await? {
        let cents = get_latest_balance(db, &account).await?;
        balances.push(CurrentAccountBalance {
            account_id: account.id,
            account: account.name,
            balance: cents_to_dollars(cents),
        });
    }
    Ok(balances)
}
