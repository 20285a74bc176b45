//! Per-user email preferences.

use crate::{
    entities::{UserSettings, user_settings},
    errors::Result,
    forms::settings::EmailPreferences,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Inserts the default settings row (everything enabled).
pub async fn create_default_settings<C>(db: &C, user_id: i64) -> Result<user_settings::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    user_settings::ActiveModel {
        user_id: Set(user_id),
        weekly_reminder_enabled: Set(true),
        weekly_summary_enabled: Set(true),
        monthly_summary_enabled: Set(true),
        yearly_summary_enabled: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Returns the user's settings, creating the default row when missing.
pub async fn get_or_create_settings(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<user_settings::Model> {
    let existing = UserSettings::find()
        .filter(user_settings::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    match existing {
        Some(settings) => Ok(settings),
        None => create_default_settings(db, user_id).await,
    }
}

/// Overwrites the four email preferences.
pub async fn update_settings(
    db: &DatabaseConnection,
    user_id: i64,
    preferences: EmailPreferences,
) -> Result<user_settings::Model> {
    let mut active: user_settings::ActiveModel = get_or_create_settings(db, user_id).await?.into();
    active.weekly_reminder_enabled = Set(preferences.weekly_reminder_enabled);
    active.weekly_summary_enabled = Set(preferences.weekly_summary_enabled);
    active.monthly_summary_enabled = Set(preferences.monthly_summary_enabled);
    active.yearly_summary_enabled = Set(preferences.yearly_summary_enabled);
    active.updated_at = Set(Utc::now());
    let settings = active.update(db).await?;

    info!(user_id, ?preferences, "Email preferences updated");
    Ok(settings)
}
