//! Login and sign-up forms.

use super::{FieldErrors, add_error, lenient_string, max_length, required};
use serde::Deserialize;

/// Longest username accepted
pub const USERNAME_MAX_LENGTH: usize = 150;
/// Shortest password accepted
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Raw login input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    /// Login name
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: Option<String>,
    /// Plain-text password
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: Option<String>,
    /// Where to go after logging in
    #[serde(default, deserialize_with = "lenient_string")]
    pub next: Option<String>,
}

/// Validated login credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

impl LoginForm {
    /// Both fields are required.
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = required(&mut errors, "username", self.username.as_deref());
        // Passwords are not trimmed.
        let password = self.password.clone().filter(|p| !p.is_empty());
        if password.is_none() {
            add_error(&mut errors, "password", super::REQUIRED);
        }
        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials { username, password }),
            _ => Err(errors),
        }
    }
}

/// Raw sign-up input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    /// Login name
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: Option<String>,
    /// Contact address
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    /// Password
    #[serde(default, deserialize_with = "lenient_string")]
    pub password1: Option<String>,
    /// Password confirmation
    #[serde(default, deserialize_with = "lenient_string")]
    pub password2: Option<String>,
}

/// Validated sign-up input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

fn valid_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

impl SignUpForm {
    /// Checks formats and password rules. Uniqueness of username and email is
    /// checked against the database by `crate::core::auth::signup`.
    pub fn validate(&self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = required(&mut errors, "username", self.username.as_deref()).filter(|u| {
            if !max_length(&mut errors, "username", u, USERNAME_MAX_LENGTH) {
                return false;
            }
            let ok = u.chars().all(valid_username_char);
            if !ok {
                add_error(
                    &mut errors,
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
            ok
        });

        let email = required(&mut errors, "email", self.email.as_deref()).filter(|e| {
            let ok = e
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
            if !ok {
                add_error(&mut errors, "email", "Enter a valid email address.");
            }
            ok
        });

        let password1 = self.password1.clone().filter(|p| !p.is_empty());
        let password2 = self.password2.clone().filter(|p| !p.is_empty());
        if password1.is_none() {
            add_error(&mut errors, "password1", super::REQUIRED);
        }
        if password2.is_none() {
            add_error(&mut errors, "password2", super::REQUIRED);
        }
        if let (Some(p1), Some(p2)) = (&password1, &password2) {
            if p1 != p2 {
                add_error(&mut errors, "password2", "The two password fields didn't match.");
            } else if p1.chars().count() < PASSWORD_MIN_LENGTH {
                add_error(
                    &mut errors,
                    "password2",
                    format!(
                        "This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."
                    ),
                );
            }
        }

        match (username, email, password1) {
            (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(NewUser {
                username,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}
