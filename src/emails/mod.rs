//! Scheduled emails.
//!
//! Every email task finds the eligible users, computes their figures, renders
//! a plain text message, sends it and records an `email_logs` row whether or
//! not the send succeeded. A failed send never stops the batch.

use crate::{
    entities::{EmailType, Transaction, User, email_log, transaction, user, user_settings},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use mailer::{EmailMessage, Mailer};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::{info, warn};

/// Mail transports
pub mod mailer;
/// Monthly summary email
pub mod monthly_summary;
/// Weekly "log your expenses" reminder
pub mod weekly_reminder;
/// Weekly spending summary
pub mod weekly_summary;
/// Year in review email
pub mod yearly_summary;

/// Closing lines shared by every email.
pub const SIGN_OFF: &str = "Best regards,\nClink Finance Team\n\n---\n\n\
To manage your email preferences, log in to your account and visit your settings page.\n";

/// Counters returned by every email task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmailOutcome {
    /// Messages the transport accepted
    pub sent: usize,
    /// Messages the transport rejected
    pub failed: usize,
}

impl EmailOutcome {
    fn record(&mut self, success: bool) {
        if success {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Users who enabled `preference` and have a non-empty email address.
pub(crate) async fn opted_in_users(
    db: &DatabaseConnection,
    preference: user_settings::Column,
) -> Result<Vec<user::Model>> {
    User::find()
        .inner_join(crate::entities::UserSettings)
        .filter(preference.eq(true))
        .filter(user::Column::Email.ne(""))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of users with at least one transaction dated on or after `start`, and
/// on or before `end` when given.
pub(crate) async fn users_with_transactions(
    db: &DatabaseConnection,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<HashSet<i64>> {
    let mut query = Transaction::find().filter(transaction::Column::DateOfExpense.gte(start));
    if let Some(end) = end {
        query = query.filter(transaction::Column::DateOfExpense.lte(end));
    }
    let ids: Vec<i64> = query
        .select_only()
        .column(transaction::Column::UserId)
        .distinct()
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Sends one message and records the attempt.
///
/// # Returns
/// Whether the transport accepted the message. Only database errors are
/// returned as `Err`.
pub async fn send_email_with_logging(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    user: &user::Model,
    email_type: EmailType,
    subject: String,
    content: String,
) -> Result<bool> {
    let email_data = json!({
        "subject": subject,
        "content": content,
        "recipient": user.email,
    });
    let message = EmailMessage {
        from: mailer.from_address().to_string(),
        to: user.email.clone(),
        subject,
        body: content,
    };

    let error_message = match mailer.send(&message).await {
        Ok(()) => None,
        Err(e) => {
            warn!(
                user_id = user.id,
                email_type = email_type.label(),
                error = %e,
                "Email send failed"
            );
            Some(e.to_string())
        }
    };
    let success = error_message.is_none();

    email_log::ActiveModel {
        user_id: Set(user.id),
        email_type: Set(email_type),
        sent_at: Set(Utc::now()),
        success: Set(success),
        error_message: Set(error_message),
        email_data: Set(Some(email_data)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(success)
}

/// A rendered message for one user.
pub(crate) struct Rendered {
    pub(crate) user: user::Model,
    pub(crate) subject: String,
    pub(crate) content: String,
}

/// Sends each rendered message and counts the results.
pub(crate) async fn send_batch(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    email_type: EmailType,
    messages: Vec<Rendered>,
) -> Result<EmailOutcome> {
    let mut outcome = EmailOutcome::default();
    for Rendered { user, subject, content } in messages {
        let success = send_email_with_logging(
            db,
            mailer,
            &user,
            email_type,
            subject,
            content,
        )
        .await?;
        outcome.record(success);
    }
    info!(
        email_type = email_type.label(),
        sent = outcome.sent,
        failed = outcome.failed,
        "Email batch finished"
    );
    Ok(outcome)
}
