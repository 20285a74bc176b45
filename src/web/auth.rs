//! Login, sign-up and logout.

use super::{
    AppState,
    error::{LOGIN_PATH, found},
    session::{CurrentUser, expired_session_cookie, session_cookie, session_token},
};
use crate::{
    core::auth,
    entities::user,
    errors::{Error, Result},
    forms::{
        FieldErrors, NON_FIELD_ERRORS, add_error,
        auth::{LoginForm, SignUpForm},
    },
};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Where to go after a successful login when no `next` was given.
const HOME_PATH: &str = "/";

/// Query of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    /// Path to return to
    pub next: Option<String>,
}

/// Only same-site absolute paths are honoured.
fn safe_next(next: Option<&str>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or(HOME_PATH)
        .to_string()
}

/// GET /login
pub async fn login_page(
    Query(query): Query<NextQuery>,
    user: Option<CurrentUser>,
) -> Json<serde_json::Value> {
    Json(json!({
        "authenticated": user.is_some(),
        "next": safe_next(query.next.as_deref()),
        "fields": ["username", "password"],
    }))
}

/// Opens a session and answers with the token and a session cookie.
async fn logged_in(
    state: &AppState,
    user: &user::Model,
    next: String,
    status: StatusCode,
) -> Result<Response> {
    let session = auth::create_session(&state.db, user.id).await?;
    let cookie = session_cookie(&session.token).map_err(|e| Error::Config {
        message: format!("Session token is not a valid header value: {e}"),
    })?;
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "token": session.token,
            "user": user,
            "next": next,
        })),
    )
        .into_response())
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Json(form): Json<LoginForm>,
) -> Result<Response> {
    let credentials = form.validate()?;
    let Some(user) = auth::authenticate(&state.db, &credentials).await? else {
        let mut errors = FieldErrors::new();
        add_error(&mut errors, NON_FIELD_ERRORS, "Invalid username or password.");
        return Err(errors.into());
    };

    info!(user_id = user.id, "User logged in");
    let next = safe_next(form.next.as_deref().or(query.next.as_deref()));
    logged_in(&state, &user, next, StatusCode::OK).await
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignUpForm>,
) -> Result<Response> {
    let new_user = form.validate()?;
    let user = auth::signup(&state.db, &new_user).await?;
    logged_in(&state, &user, HOME_PATH.to_string(), StatusCode::CREATED).await
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = session_token(&headers) {
        auth::logout(&state.db, &token).await?;
    }
    let mut response = found(LOGIN_PATH);
    response.headers_mut().insert(header::SET_COOKIE, expired_session_cookie());
    Ok(response)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::super::tests::{body_json, get, post_json, test_app};
    use super::*;
    use crate::test_utils::{TEST_PASSWORD, create_test_user};

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/transactions")), "/transactions");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_token_works() -> Result<()> {
        let (app, db) = test_app().await?;
        create_test_user(&db, "alice").await?;

        let response = post_json(
            &app,
            "/login",
            None,
            json!({ "username": "alice", "password": TEST_PASSWORD, "next": "/settings" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("Max-Age=1209600"));
        let body = body_json(response).await;
        assert_eq!(body["next"], "/settings");
        assert!(body["user"].get("password_hash").is_none());

        let token = body["token"].as_str().unwrap();
        let settings = get(&app, "/settings", Some(token)).await;
        assert_eq!(settings.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_password_is_400() -> Result<()> {
        let (app, db) = test_app().await?;
        create_test_user(&db, "alice").await?;

        let response = post_json(
            &app,
            "/login",
            None,
            json!({ "username": "alice", "password": "nope" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][NON_FIELD_ERRORS][0], "Invalid username or password.");
        Ok(())
    }

    #[tokio::test]
    async fn test_signup_then_logout_closes_session() -> Result<()> {
        let (app, _db) = test_app().await?;

        let response = post_json(
            &app,
            "/signup",
            None,
            json!({
                "username": "carol",
                "email": "carol@example.com",
                "password1": "longenough1",
                "password2": "longenough1",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let token = body_json(response).await["token"].as_str().unwrap().to_string();

        let logout = post_json(&app, "/logout", Some(&token), json!({})).await;
        assert_eq!(logout.status(), StatusCode::FOUND);
        assert_eq!(logout.headers()[header::LOCATION], "/login");

        let after = get(&app, "/settings", Some(&token)).await;
        assert_eq!(after.status(), StatusCode::FOUND);
        assert_eq!(after.headers()[header::LOCATION], "/login?next=/settings");
        Ok(())
    }
}
