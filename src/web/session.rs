//! Session handling for the HTTP layer.
//!
//! A session token is accepted either as `Authorization: Bearer <token>` or
//! as the `session` cookie set by the login and sign-up handlers.

use super::{AppState, error::login_redirect};
use crate::{
    core::auth::{self, SESSION_MAX_AGE_DAYS},
    entities::user,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Reads the session token from the request headers.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value opening a session.
pub fn session_cookie(token: &str) -> Result<HeaderValue, header::InvalidHeaderValue> {
    let max_age = SESSION_MAX_AGE_DAYS * 24 * 60 * 60;
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age}; SameSite=Lax"
    ))
}

/// `Set-Cookie` value clearing the session.
#[must_use]
pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

/// The authenticated user of a request.
///
/// Rejects with a 302 to `/login?next=<path>` when no valid session is presented.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts.uri.path_and_query().map_or("/", |p| p.as_str());
        let Some(token) = session_token(&parts.headers) else {
            debug!(path = next, "No session presented");
            return Err(login_redirect(next));
        };

        match auth::user_for_token(&state.db, &token).await {
            Ok(Some(user)) => Ok(Self(user)),
            Ok(None) => {
                debug!(path = next, "Unknown session");
                Err(login_redirect(next))
            }
            Err(e) => Err(e.into_response()),
        }
    }
}
