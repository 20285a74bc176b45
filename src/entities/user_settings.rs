//! User settings entity - per-user switches for each scheduled email.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i64,
    /// Owning user, one row per user
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub user_id: i64,
    /// Send the "log your expenses" nudge
    pub weekly_reminder_enabled: bool,
    /// Send the seven-day spending summary
    pub weekly_summary_enabled: bool,
    /// Send the monthly summary
    pub monthly_summary_enabled: bool,
    /// Send the year in review
    pub yearly_summary_enabled: bool,
    /// When the row was created
    #[serde(skip_serializing)]
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    #[serde(skip_serializing)]
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between settings and users
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each settings row belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
