//! Transaction entity - one income or expense entry.
//!
//! A transaction is classified by `transaction_type` and a free-text `category`;
//! budgets match transactions on that (type, category) pair within a month.

use super::sea_orm_active_enums::TransactionType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Optional account the money moved through
    pub account_id: Option<i64>,
    /// INCOME, NEED, WANT, ...
    #[sea_orm(column_name = "type")]
    pub transaction_type: TransactionType,
    /// Category name, e.g. "Groceries"
    pub category: String,
    /// Always positive, in cents
    pub amount_cents: i64,
    /// Calendar date the money moved
    pub date_of_expense: Date,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Amount in dollars.
    #[must_use]
    pub fn amount_dollars(&self) -> f64 {
        crate::core::money::cents_to_dollars(self.amount_cents)
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Optional account link
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "SetNull"
    )]
    Account,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
