//! Account balance entity - one snapshot in an account's balance history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Balance snapshot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_balances")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Account this snapshot belongs to
    pub account_id: i64,
    /// Balance at `created_at`, in cents
    pub balance_cents: i64,
    /// When the snapshot was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between snapshots and accounts
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each snapshot belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
