//! Email log entity - immutable audit record of one send attempt.

use super::sea_orm_active_enums::EmailType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Email log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_logs")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient user
    pub user_id: i64,
    /// Which scheduled email this was
    pub email_type: EmailType,
    /// When the attempt was made
    pub sent_at: DateTimeUtc,
    /// Whether the transport accepted the message
    pub success: bool,
    /// Transport error when `success` is false
    pub error_message: Option<String>,
    /// Snapshot of subject, content and recipient
    pub email_data: Option<Json>,
}

/// Defines relationships between logs and users
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each log belongs to one user
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
