//! Internal transfer endpoints.

use super::{AppState, session::CurrentUser};
use crate::{
    core::transfer::{
        create_transfer, delete_transfer, list_transfers_for_budget, list_transfers_for_period,
    },
    errors::Result,
    forms::transfer::InternalTransferForm,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Routes of this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", get(list))
        .route("/transfers/create", post(create))
        .route("/transfers/:id/delete", post(delete).delete(delete))
}

/// POST /transfers/create
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<InternalTransferForm>,
) -> Result<Json<Value>> {
    let input = form.validate()?;
    let transfer = create_transfer(&state.db, user.id, input).await?;
    Ok(Json(json!({
        "success": true,
        "transfer_id": transfer.id,
        "source_budget_id": transfer.source_budget_id,
        "destination_budget_id": transfer.destination_budget_id,
    })))
}

/// Query of the transfer list.
#[derive(Debug, Default, Deserialize)]
pub struct TransferQuery {
    /// One budget
    pub budget_id: Option<i64>,
    /// Or every budget of a month
    pub year: Option<i32>,
    /// Month of `year`
    pub month: Option<u32>,
}

/// GET /transfers?budget_id= or ?year=&month=
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TransferQuery>,
) -> Result<Response> {
    let transfers = match (query.budget_id, query.year, query.month) {
        (Some(budget_id), _, _) => list_transfers_for_budget(&state.db, user.id, budget_id).await?,
        (None, Some(year), Some(month)) => {
            list_transfers_for_period(&state.db, user.id, year, month).await?
        }
        _ => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Either budget_id or year/month must be provided",
                })),
            )
                .into_response());
        }
    };
    Ok(Json(json!({ "success": true, "transfers": transfers })).into_response())
}

/// POST or DELETE /transfers/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    delete_transfer(&state.db, user.id, id).await?;
    Ok(Json(json!({ "success": true })))
}
