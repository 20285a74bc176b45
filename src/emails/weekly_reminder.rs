//! "Log your expenses" nudge for users who recorded nothing in the last week.

use super::{
    EmailOutcome, Rendered, SIGN_OFF, mailer::Mailer, opted_in_users, send_batch,
    users_with_transactions,
};
use crate::{
    entities::{EmailType, user, user_settings},
    errors::Result,
};
use chrono::{Days, NaiveDate};
use sea_orm::DatabaseConnection;

/// Opted-in users without a transaction dated within the last seven days.
pub async fn get_users_needing_reminders(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<user::Model>> {
    let since = today - Days::new(7);
    let active = users_with_transactions(db, since, None).await?;
    Ok(opted_in_users(db, user_settings::Column::WeeklyReminderEnabled)
        .await?
        .into_iter()
        .filter(|u| !active.contains(&u.id))
        .collect())
}

/// Subject line.
#[must_use]
pub fn build_reminder_email_subject() -> String {
    "Reminder: Log Your Expenses This Week".to_string()
}

/// Message body.
#[must_use]
pub fn build_reminder_email_content(user: &user::Model) -> String {
    format!(
        "Hello {},\n\n\
We noticed you haven't logged any expenses in the past 7 days.\n\n\
Keeping track of your spending helps you stay on top of your financial goals. \
Take a moment to add any recent expenses you may have forgotten.\n\n\
If you've already logged everything, great job staying organized!\n\n\
{SIGN_OFF}",
        user.display_name()
    )
}

/// Sends the reminder to every eligible user.
pub async fn send_weekly_reminders(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    today: NaiveDate,
) -> Result<EmailOutcome> {
    let messages = get_users_needing_reminders(db, today)
        .await?
        .into_iter()
        .map(|user| Rendered {
            subject: build_reminder_email_subject(),
            content: build_reminder_email_content(&user),
            user,
        })
        .collect();
    send_batch(db, mailer, EmailType::WeeklyReminder, messages).await
}
