//! Unified error type for the whole crate.
//!
//! Core services, forms, jobs and the HTTP layer all return [`Result`]. The web
//! layer converts an [`Error`] into a status code and JSON body in
//! `crate::web::error`.

use crate::forms::FieldErrors;
use thiserror::Error;

/// Every failure the application can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
    },

    /// Any error raised by `SeaORM` or the underlying driver
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A row was missing, or belongs to another user
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name, e.g. "Budget"
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Form validation failed
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// An amount was zero, negative or not representable
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Offending amount in cents
        amount: i64,
    },

    /// A year/month pair that does not name a calendar month
    #[error("Invalid period: {year}-{month}")]
    InvalidPeriod {
        /// Year component
        year: i32,
        /// Month component
        month: u32,
    },

    /// No valid session was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// The mail transport rejected a message
    #[error("Mail transport error: {message}")]
    Mail {
        /// Transport specific description
        message: String,
    },

    /// A password could not be hashed
    #[error("Password hashing error: {0}")]
    PasswordHash(argon2::password_hash::Error),

    /// I/O failure (config file, socket bind)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// JSON (de)serialisation failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Integer conversion overflow
    #[error("Conversion error: {0}")]
    Conversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] with a displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<FieldErrors> for Error {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
