//! Key/value bookkeeping in the `system_state` table.
//!
//! The scheduler records the last date each job ran so that a restart within
//! the same period does not repeat it.

use crate::{
    entities::{SystemState, system_state},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Set, prelude::*};

/// Reads a raw value.
pub async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    Ok(SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?
        .map(|s| s.value))
}

/// Inserts or replaces a value.
pub async fn set_value<C>(db: &C, key: &str, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        system_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Reads a date stored as `YYYY-MM-DD`.
pub async fn get_date<C>(db: &C, key: &str) -> Result<Option<NaiveDate>>
where
    C: ConnectionTrait,
{
    match get_value(db, key).await? {
        Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| Error::Config {
                message: format!("Failed to parse stored date for {key}: {e}"),
            }),
        None => Ok(None),
    }
}

/// Stores a date as `YYYY-MM-DD`.
pub async fn set_date<C>(db: &C, key: &str, date: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    set_value(db, key, date.format("%Y-%m-%d").to_string()).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_set_and_overwrite_date() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(get_date(&db, "job.test.last_run").await?, None);

        let first = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        set_date(&db, "job.test.last_run", first).await?;
        assert_eq!(get_date(&db, "job.test.last_run").await?, Some(first));

        let second = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        set_date(&db, "job.test.last_run", second).await?;
        assert_eq!(get_date(&db, "job.test.last_run").await?, Some(second));
        assert_eq!(SystemState::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_date_is_config_error() -> Result<()> {
        let db = setup_test_db().await?;
        set_value(&db, "job.bad", "not a date".to_string()).await?;
        assert!(matches!(get_date(&db, "job.bad").await, Err(Error::Config { .. })));
        Ok(())
    }
}
