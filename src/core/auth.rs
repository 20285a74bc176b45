//! Users, password hashing and login sessions.
//!
//! Passwords are stored as Argon2id PHC strings. A session is a random token
//! row; the web layer reads it from a `session` cookie or a bearer header.
//! Sessions expire [`SESSION_MAX_AGE_DAYS`] after they were opened.

use super::settings::create_default_settings;
use crate::{
    config::admin::AdminCredentials,
    entities::{Session, User, session, user},
    errors::{Error, Result},
    forms::{FieldErrors, add_error, auth::{Credentials, NewUser}},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::SaltString,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, warn};
use uuid::Uuid;

/// Lifetime of a login session.
pub const SESSION_MAX_AGE_DAYS: i64 = 14;

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(Error::PasswordHash)?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(Error::PasswordHash)
}

/// Checks a password against a stored hash. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn session_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(SESSION_MAX_AGE_DAYS)
}

/// Inserts a user together with their default settings row.
pub async fn create_user<C>(
    db: &C,
    username: &str,
    email: &str,
    password: &str,
    is_superuser: bool,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        first_name: Set(String::new()),
        password_hash: Set(hash_password(password)?),
        is_superuser: Set(is_superuser),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    create_default_settings(db, user.id).await?;
    Ok(user)
}

/// Registers a new user after checking username and email are free.
pub async fn signup(db: &DatabaseConnection, input: &NewUser) -> Result<user::Model> {
    let mut errors = FieldErrors::new();
    let username_taken = User::find()
        .filter(user::Column::Username.eq(input.username.as_str()))
        .one(db)
        .await?
        .is_some();
    if username_taken {
        add_error(&mut errors, "username", "A user with that username already exists.");
    }
    let email_taken = User::find()
        .filter(user::Column::Email.eq(input.email.as_str()))
        .one(db)
        .await?
        .is_some();
    if email_taken {
        add_error(&mut errors, "email", "A user with that email already exists.");
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let txn = db.begin().await?;
    let user = create_user(&txn, &input.username, &input.email, &input.password, false).await?;
    txn.commit().await?;

    info!(user_id = user.id, username = %user.username, "User signed up");
    Ok(user)
}

/// Returns the user when the credentials match.
pub async fn authenticate(
    db: &DatabaseConnection,
    credentials: &Credentials,
) -> Result<Option<user::Model>> {
    let user = User::find()
        .filter(user::Column::Username.eq(credentials.username.as_str()))
        .one(db)
        .await?;
    let user = user.filter(|u| verify_password(&credentials.password, &u.password_hash));
    if user.is_none() {
        warn!(username = %credentials.username, "Failed login attempt");
    }
    Ok(user)
}

/// Opens a session for `user_id`.
pub async fn create_session(db: &DatabaseConnection, user_id: i64) -> Result<session::Model> {
    let session = session::ActiveModel {
        token: Set(Uuid::new_v4().simple().to_string()),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(user_id, "Session opened");
    Ok(session)
}

/// Resolves a session token to its user. Expired sessions resolve to `None`.
pub async fn user_for_token(db: &DatabaseConnection, token: &str) -> Result<Option<user::Model>> {
    let found = Session::find()
        .filter(session::Column::Token.eq(token))
        .filter(session::Column::CreatedAt.gt(session_cutoff(Utc::now())))
        .find_also_related(User)
        .one(db)
        .await?;
    Ok(found.and_then(|(_, user)| user))
}

/// Deletes the session behind `token`. Unknown tokens are ignored.
pub async fn logout(db: &DatabaseConnection, token: &str) -> Result<()> {
    let result = Session::delete_many()
        .filter(session::Column::Token.eq(token))
        .exec(db)
        .await?;
    info!(closed = result.rows_affected, "Session closed");
    Ok(())
}

/// Deletes every session opened more than [`SESSION_MAX_AGE_DAYS`] before `now`.
pub async fn purge_expired_sessions(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<u64> {
    let result = Session::delete_many()
        .filter(session::Column::CreatedAt.lte(session_cutoff(now)))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        info!(removed = result.rows_affected, "Expired sessions purged");
    }
    Ok(result.rows_affected)
}

/// Creates the bootstrap administrator unless a superuser already exists or
/// no credentials are configured.
///
/// # Returns
/// The new administrator, or `None` when creation was skipped.
pub async fn ensure_default_admin(
    db: &DatabaseConnection,
    credentials: Option<AdminCredentials>,
) -> Result<Option<user::Model>> {
    let has_superuser = User::find()
        .filter(user::Column::IsSuperuser.eq(true))
        .one(db)
        .await?
        .is_some();
    if has_superuser {
        info!("Superuser already exists, skipping creation");
        return Ok(None);
    }

    let Some(credentials) = credentials else {
        warn!("Skipping superuser creation: admin username, email and password must all be set");
        return Ok(None);
    };

    let admin = create_user(
        db,
        &credentials.username,
        &credentials.email,
        &credentials.password,
        true,
    )
    .await?;
    info!(username = %admin.username, "Created default superuser");
    Ok(Some(admin))
}
