//! Email settings, accounts and the category catalog.

use super::{AppState, session::CurrentUser};
use crate::{
    core::{account, category::list_categories, settings},
    entities::{CategoryKind, category, user_settings},
    errors::Result,
    forms::{
        account::{AccountForm, BalanceForm},
        settings::UserSettingsForm,
    },
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
        .route("/settings", get(show_settings).post(save_settings))
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id/balance", post(record_balance))
        .route("/categories", get(categories))
}

/// GET /settings
pub async fn show_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<user_settings::Model>> {
    settings::get_or_create_settings(&state.db, user.id).await.map(Json)
}

/// POST /settings
pub async fn save_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<UserSettingsForm>,
) -> Result<Json<Value>> {
    let saved = settings::update_settings(&state.db, user.id, form.clean()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Settings updated successfully!",
        "settings": saved,
    })))
}

/// GET /accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let accounts = account::get_latest_user_account_balances(&state.db, user.id).await?;
    Ok(Json(json!({ "success": true, "accounts": accounts })))
}

/// POST /accounts
pub async fn create_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<AccountForm>,
) -> Result<Response> {
    let input = form.validate()?;
    let created = account::create_account(&state.db, user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "account_id": created.id })),
    )
        .into_response())
}

/// POST /accounts/:id/balance
pub async fn record_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<BalanceForm>,
) -> Result<Json<Value>> {
    let cents = form.validate()?;
    let snapshot = account::record_balance(&state.db, user.id, id, cents).await?;
    Ok(Json(json!({ "success": true, "balance_id": snapshot.id })))
}

/// Query of the category catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// `income`, `expense` or `all`
    pub kind: Option<String>,
}

/// GET /categories?kind=
pub async fn categories(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<CategoryQuery>,
) -> Result<Response> {
    let kind = match query.kind.as_deref() {
        None | Some("" | "all") => None,
        Some(name) => match CategoryKind::from_name(name) {
            Some(kind) => Some(kind),
            None => {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "error": "Invalid kind" })),
                )
                    .into_response());
            }
        },
    };
    let categories: Vec<category::Model> = list_categories(&state.db, kind).await?;
    Ok(Json(json!({ "success": true, "categories": categories })).into_response())
}
