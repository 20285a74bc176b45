//! Budget entity - one envelope for a (category, type, year, month) slot.
//!
//! A user has at most one budget per slot. When `allow_carry_over` is set, the
//! unspent remainder at month end is copied into the next month's slot as
//! `carried_over_cents`.

use super::sea_orm_active_enums::TransactionType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// INCOME, NEED, WANT, ...
    #[sea_orm(column_name = "type")]
    pub budget_type: TransactionType,
    /// Category name matched against transactions
    pub category: String,
    /// Planned amount in cents
    pub amount_cents: i64,
    /// Calendar year of the envelope
    pub budget_year: i32,
    /// Calendar month of the envelope, 1-12
    pub budget_month: i32,
    /// Whether the unspent remainder rolls into next month
    pub allow_carry_over: bool,
    /// Remainder received from the previous month, in cents
    pub carried_over_cents: i64,
    /// When the budget was created
    pub created_at: DateTimeUtc,
    /// When the budget was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Planned amount in dollars.
    #[must_use]
    pub fn amount_dollars(&self) -> f64 {
        crate::core::money::cents_to_dollars(self.amount_cents)
    }

    /// Carried-over amount in dollars.
    #[must_use]
    pub fn carried_over_dollars(&self) -> f64 {
        crate::core::money::cents_to_dollars(self.carried_over_cents)
    }

    /// Month as `u32` for date arithmetic. Stored months are always 1-12.
    #[must_use]
    pub fn month(&self) -> u32 {
        u32::try_from(self.budget_month).unwrap_or(1)
    }
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each budget belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Category allocations within this envelope
    #[sea_orm(has_many = "super::budget_allocation::Entity")]
    Allocations,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::budget_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
