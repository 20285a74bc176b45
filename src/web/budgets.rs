//! Budget endpoints: slots, month setup, detail, categories and allocations.

use super::{AppState, session::CurrentUser};
use crate::{
    core::{
        allocation::{
            BudgetSummary, get_budget_summary, get_previous_allocations, get_unallocated_amount,
            process_allocation_rollover, replace_allocations,
        },
        budget::{
            delete_budget, get_budget_categories, get_budgets_with_available, get_user_budget,
            save_multi_budget, update_budget, update_or_create_budget,
        },
        money::cents_to_dollars,
        period::validate_period,
    },
    entities::TransactionType,
    errors::Result,
    forms::budget::{AllocationForm, BudgetItemForm, BudgetSlotForm, MultiBudgetForm},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Routes of this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets/create", post(create))
        .route("/budgets/setup", post(setup))
        .route("/budgets/:id", get(detail))
        .route("/budgets/:id/update", post(update))
        .route("/budgets/:id/delete", post(delete).delete(delete))
        .route("/budgets/:id/allocations", get(allocations).post(save_allocations))
        .route("/budgets/:id/allocations/rollover", post(rollover))
        .route("/budgets/categories/:year/:month/:type", get(categories))
        .route("/budgets/month/:year/:month", get(month))
}

/// POST /budgets/create
///
/// Updates the (category, type, month) slot if it exists, otherwise creates it.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<BudgetSlotForm>,
) -> Result<Json<Value>> {
    let slot = form.validate()?;
    let (budget, created) = update_or_create_budget(
        &state.db,
        user.id,
        slot.year,
        slot.month,
        &slot.item,
    )
    .await?;
    Ok(Json(json!({ "success": true, "budget_id": budget.id, "created": created })))
}

/// POST /budgets/setup
pub async fn setup(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<MultiBudgetForm>,
) -> Result<Json<Value>> {
    let input = form.validate()?;
    let saved = save_multi_budget(&state.db, user.id, &input).await?;
    let ids: Vec<i64> = saved.iter().map(|b| b.id).collect();
    Ok(Json(json!({ "success": true, "budget_ids": ids })))
}

/// Budget as returned by the detail endpoint.
#[derive(Debug, Serialize)]
pub struct BudgetDetail {
    id: i64,
    #[serde(rename = "type")]
    budget_type: TransactionType,
    category: String,
    amount: f64,
    allow_carry_over: bool,
    carried_over_amount: f64,
    year: i32,
    month: u32,
}

/// GET /budgets/:id
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<BudgetDetail>> {
    let budget = get_user_budget(&state.db, user.id, id).await?;
    Ok(Json(BudgetDetail {
        id: budget.id,
        budget_type: budget.budget_type,
        amount: budget.amount_dollars(),
        carried_over_amount: budget.carried_over_dollars(),
        allow_carry_over: budget.allow_carry_over,
        year: budget.budget_year,
        month: budget.month(),
        category: budget.category,
    }))
}

/// POST /budgets/:id/update
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<BudgetItemForm>,
) -> Result<Json<Value>> {
    get_user_budget(&state.db, user.id, id).await?;
    let item = form.validate()?;
    let budget = update_budget(&state.db, user.id, id, &item).await?;
    Ok(Json(json!({ "success": true, "budget_id": budget.id })))
}

/// POST or DELETE /budgets/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    delete_budget(&state.db, user.id, id).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /budgets/categories/:year/:month/:type
pub async fn categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((year, month, type_name)): Path<(i32, u32, String)>,
) -> Result<Response> {
    let Some(budget_type) = TransactionType::from_name(&type_name) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Invalid type" })),
        )
            .into_response());
    };
    validate_period(year, month)?;
    let categories = get_budget_categories(&state.db, user.id, year, month, budget_type).await?;
    Ok(Json(json!({ "success": true, "categories": categories })).into_response())
}

/// GET /budgets/month/:year/:month
pub async fn month(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<Value>> {
    validate_period(year, month)?;
    let budgets = get_budgets_with_available(&state.db, user.id, year, month).await?;
    Ok(Json(json!({ "success": true, "budgets": budgets })))
}

/// Allocation page of one budget.
#[derive(Debug, Serialize)]
pub struct AllocationPage {
    success: bool,
    summary: BudgetSummary,
    unallocated: f64,
    /// Previous month's amounts keyed by category id, for prefilling
    previous_allocations: HashMap<i64, f64>,
}

/// GET /budgets/:id/allocations
pub async fn allocations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<AllocationPage>> {
    let summary = get_budget_summary(&state.db, user.id, id).await?;
    let unallocated = get_unallocated_amount(&state.db, user.id, id).await?;
    let previous_allocations = get_previous_allocations(&state.db, user.id, id)
        .await?
        .into_iter()
        .map(|(category_id, cents)| (category_id, cents_to_dollars(cents)))
        .collect();
    Ok(Json(AllocationPage {
        success: true,
        summary,
        unallocated: cents_to_dollars(unallocated),
        previous_allocations,
    }))
}

/// POST /budgets/:id/allocations
pub async fn save_allocations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(form): Json<AllocationForm>,
) -> Result<Json<Value>> {
    replace_allocations(&state.db, user.id, id, &form).await?;
    let summary = get_budget_summary(&state.db, user.id, id).await?;
    Ok(Json(json!({ "success": true, "summary": summary })))
}

/// Body of the rollover endpoint.
#[derive(Debug, Deserialize)]
pub struct RolloverRequest {
    /// Budget receiving the leftovers
    pub to_budget_id: i64,
}

/// POST /budgets/:id/allocations/rollover
pub async fn rollover(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<RolloverRequest>,
) -> Result<Json<Value>> {
    let rolled = process_allocation_rollover(&state.db, user.id, id, request.to_budget_id).await?;
    Ok(Json(json!({ "success": true, "rolled_over": rolled })))
}
