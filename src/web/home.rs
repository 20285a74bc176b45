//! Home page, monthly dashboard and year review.

use super::{AppState, session::CurrentUser, today};
use crate::{
    core::{
        dashboard::{HomeContext, MonthlyDashboard, build_home_context, get_months_dashboard},
        period::validate_period,
        year_review::{YearReview, build_year_review},
    },
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::Datelike;

/// Routes of this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/month/:year/:month", get(month))
        .route("/dashboard/:year/:month", get(dashboard))
        .route("/year-review", get(current_year_review))
        .route("/year-review/:year", get(year_review))
}

/// GET /
pub async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<HomeContext>> {
    let today = today();
    build_home_context(&state.db, user.id, today.year(), today.month())
        .await
        .map(Json)
}

/// GET /month/:year/:month
pub async fn month(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<HomeContext>> {
    build_home_context(&state.db, user.id, year, month).await.map(Json)
}

/// GET /dashboard/:year/:month
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthlyDashboard>> {
    validate_period(year, month)?;
    get_months_dashboard(&state.db, user.id, year, month).await.map(Json)
}

/// GET /year-review
pub async fn current_year_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<YearReview>> {
    build_year_review(&state.db, user.id, today().year()).await.map(Json)
}

/// GET /year-review/:year
pub async fn year_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(year): Path<i32>,
) -> Result<Json<YearReview>> {
    build_year_review(&state.db, user.id, year).await.map(Json)
}
