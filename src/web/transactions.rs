//! Transaction list and CRUD endpoints.

use super::{AppState, session::CurrentUser, today};
use crate::{
    core::{
        account::get_user_account,
        filter::{TransactionFilters, TransactionListContext, build_transaction_list_context},
        transaction,
    },
    errors::Result,
    forms::transaction::{CleanedTransaction, TransactionForm},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

/// Routes of this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list))
        .route("/transactions/create", post(create))
        .route("/transactions/:id/update", post(update))
        .route("/transactions/:id/delete", post(delete).delete(delete))
}

/// Rejects an account that belongs to someone else.
async fn check_account(
    db: &DatabaseConnection,
    user_id: i64,
    input: &CleanedTransaction,
) -> Result<()> {
    if let Some(account_id) = input.account_id {
        get_user_account(db, user_id, account_id).await?;
    }
    Ok(())
}

/// GET /transactions
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filters): Query<TransactionFilters>,
) -> Result<Json<TransactionListContext>> {
    build_transaction_list_context(&state.db, user.id, &filters, today())
        .await
        .map(Json)
}

/// POST /transactions/create
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Value>> {
    let input = form.validate()?;
    check_account(&state.db, user.id, &input).await?;
    let created = transaction::create_transaction(&state.db, user.id, input).await?;
    Ok(Json(json!({ "success": true, "transaction_id": created.id })))
}

/// POST /transactions/:id/update
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Value>> {
    // Ownership first, so a foreign id is 404 even with an invalid body.
    transaction::get_user_transaction(&state.db, user.id, id).await?;
    let input = form.validate()?;
    check_account(&state.db, user.id, &input).await?;
    let updated = transaction::update_transaction(&state.db, user.id, id, input).await?;
    Ok(Json(json!({ "success": true, "transaction_id": updated.id })))
}

/// POST or DELETE /transactions/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    transaction::delete_transaction(&state.db, user.id, id).await?;
    Ok(Json(json!({ "success": true })))
}
