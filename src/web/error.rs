//! Maps [`Error`] onto HTTP responses.
//!
//! | Error | Status | Body |
//! |---|---|---|
//! | `NotFound` | 404 | `{success:false, error}` |
//! | `Validation` | 400 | `{success:false, errors}` |
//! | `InvalidAmount`, `InvalidPeriod` | 400 | `{success:false, error}` |
//! | `Unauthenticated` | 302 | redirect to `/login` |
//! | anything else | 500 | `{success:false, error}` |

use crate::errors::Error;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Login page every unauthenticated request is sent to.
pub const LOGIN_PATH: &str = "/login";

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `302 Found` to the login page, remembering where the user was going.
pub fn login_redirect(next: &str) -> Response {
    found(&format!("{LOGIN_PATH}?next={}", encode_next(next)))
}

/// Percent-encodes the characters that would break a `next=` query value.
fn encode_next(path: &str) -> String {
    path.chars().fold(String::with_capacity(path.len()), |mut out, c| {
        match c {
            '%' | '&' | '?' | '#' | '=' | '+' | ' ' => out.push_str(&format!("%{:02X}", c as u32)),
            _ => out.push(c),
        }
        out
    })
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound { entity, .. } => {
                failure(StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "errors": errors })),
            )
                .into_response(),
            Self::InvalidAmount { .. } | Self::InvalidPeriod { .. } => {
                failure(StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Unauthenticated => found(LOGIN_PATH),
            other => {
                error!(error = %other, "Request failed");
                failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::not_found("Budget", 3).into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::InvalidPeriod { year: 2025, month: 13 }.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Mail {
                message: "boom".to_string()
            }
            .into_response()
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_login_redirect_keeps_next() {
        let response = login_redirect("/budgets/month/2025/1");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/login?next=/budgets/month/2025/1"
        );
        assert_eq!(
            encode_next("/transactions?year=2025&month=1"),
            "/transactions%3Fyear%3D2025%26month%3D1"
        );
    }
}
