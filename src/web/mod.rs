//! JSON HTTP interface.
//!
//! Every handler authenticates through [`session::CurrentUser`], parses its
//! path, query or body, calls a form or a core service and answers with JSON.
//! Failures are rendered by the [`IntoResponse`](axum::response::IntoResponse)
//! impl in [`error`].

pub mod auth;
pub mod budgets;
pub mod error;
pub mod home;
pub mod preferences;
pub mod session;
pub mod transactions;
pub mod transfers;

use crate::errors::Result;
use axum::{
    Router,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database handle
    pub db: DatabaseConnection,
}

/// Today's date in UTC, the same clock the scheduler uses.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
        .merge(home::routes())
        .merge(transactions::routes())
        .merge(budgets::routes())
        .merge(transfers::routes())
        .merge(preferences::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the application on `bind_address` until the process stops.
pub async fn run_server(state: AppState, bind_address: &str) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!(address = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
