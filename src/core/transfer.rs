//! Internal transfers between budget envelopes.

use super::budget::{get_budgets_for_month, get_user_budget};
use crate::{
    entities::{
        Budget, InternalTransfer, TransactionType, budget, internal_transfer,
        internal_transfer::USED_FUNDS_LABEL,
    },
    errors::{Error, Result},
    forms::{FieldErrors, NON_FIELD_ERRORS, add_error, transfer::CleanedTransfer},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Checks the rules that need the stored budgets.
///
/// * amount must be positive
/// * INCOME budgets cannot be a source
/// * source and destination must differ
pub fn validate_transfer_budgets(
    source: &budget::Model,
    destination: Option<&budget::Model>,
    amount_cents: i64,
) -> std::result::Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if amount_cents <= 0 {
        add_error(&mut errors, "amount", "Transfer amount must be greater than 0.");
    }
    if source.budget_type == TransactionType::Income {
        add_error(
            &mut errors,
            "source_budget_id",
            "Cannot transfer from INCOME type budgets.",
        );
    }
    if destination.is_some_and(|d| d.id == source.id) {
        add_error(
            &mut errors,
            NON_FIELD_ERRORS,
            "Source and destination budgets cannot be the same.",
        );
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Creates a transfer between two of the user's budgets.
///
/// Both budgets must belong to `user_id`; a foreign id is reported as not found.
pub async fn create_transfer(
    db: &DatabaseConnection,
    user_id: i64,
    input: CleanedTransfer,
) -> Result<internal_transfer::Model> {
    let source = get_user_budget(db, user_id, input.source_budget_id).await?;
    let destination = match input.destination_budget_id {
        Some(id) => Some(get_user_budget(db, user_id, id).await?),
        None => None,
    };
    validate_transfer_budgets(&source, destination.as_ref(), input.amount_cents)?;

    let now = Utc::now();
    let transfer = internal_transfer::ActiveModel {
        user_id: Set(user_id),
        source_budget_id: Set(source.id),
        destination_budget_id: Set(destination.as_ref().map(|d| d.id)),
        amount_cents: Set(input.amount_cents),
        transfer_date: Set(input.transfer_date),
        description: Set(input.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        user_id,
        transfer_id = transfer.id,
        source = %source.category,
        destination = destination.as_ref().map_or(USED_FUNDS_LABEL, |d| d.category.as_str()),
        amount_cents = transfer.amount_cents,
        "Internal transfer created"
    );
    Ok(transfer)
}

/// Deletes an owned transfer.
pub async fn delete_transfer(
    db: &DatabaseConnection,
    user_id: i64,
    transfer_id: i64,
) -> Result<()> {
    let transfer = InternalTransfer::find_by_id(transfer_id)
        .filter(internal_transfer::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("InternalTransfer", transfer_id))?;
    transfer.delete(db).await?;
    Ok(())
}

/// Transfer row as shown in lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferView {
    /// Transfer id
    pub id: i64,
    /// Budget the money left
    pub source_budget_id: i64,
    /// Category of that budget
    pub source_category: String,
    /// Budget the money entered
    pub destination_budget_id: Option<i64>,
    /// Category of that budget, or "Used Funds"
    pub destination_category: String,
    /// Dollars
    pub amount: f64,
    /// ISO date
    pub transfer_date: NaiveDate,
    /// Note
    pub description: String,
}

async fn to_views(
    db: &DatabaseConnection,
    transfers: Vec<internal_transfer::Model>,
) -> Result<Vec<TransferView>> {
    let mut ids: Vec<i64> = transfers
        .iter()
        .flat_map(|t| std::iter::once(t.source_budget_id).chain(t.destination_budget_id))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let categories: HashMap<i64, String> = Budget::find()
        .filter(budget::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b.category))
        .collect();

    Ok(transfers
        .into_iter()
        .map(|t| TransferView {
            id: t.id,
            source_budget_id: t.source_budget_id,
            source_category: categories.get(&t.source_budget_id).cloned().unwrap_or_default(),
            destination_budget_id: t.destination_budget_id,
            destination_category: t
                .destination_budget_id
                .and_then(|id| categories.get(&id).cloned())
                .unwrap_or_else(|| USED_FUNDS_LABEL.to_string()),
            amount: t.amount_dollars(),
            transfer_date: t.transfer_date,
            description: t.description,
        })
        .collect())
}

async fn transfers_touching(
    db: &DatabaseConnection,
    user_id: i64,
    budget_ids: Vec<i64>,
) -> Result<Vec<TransferView>> {
    let transfers = InternalTransfer::find()
        .filter(internal_transfer::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(internal_transfer::Column::SourceBudgetId.is_in(budget_ids.clone()))
                .add(internal_transfer::Column::DestinationBudgetId.is_in(budget_ids)),
        )
        .order_by_desc(internal_transfer::Column::TransferDate)
        .order_by_desc(internal_transfer::Column::CreatedAt)
        .all(db)
        .await?;
    to_views(db, transfers).await
}

/// Transfers into or out of one owned budget, newest first.
pub async fn list_transfers_for_budget(
    db: &DatabaseConnection,
    user_id: i64,
    budget_id: i64,
) -> Result<Vec<TransferView>> {
    let budget = get_user_budget(db, user_id, budget_id).await?;
    transfers_touching(db, user_id, vec![budget.id]).await
}

/// Transfers touching any of the user's budgets in a month, newest first.
pub async fn list_transfers_for_period(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<TransferView>> {
    let ids = get_budgets_for_month(db, user_id, year, month)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    transfers_touching(db, user_id, ids).await
}
