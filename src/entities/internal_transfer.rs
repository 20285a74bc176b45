//! Internal transfer entity - money moved between two budget envelopes.
//!
//! A missing destination means the funds were used outside any envelope
//! ("Used Funds"). Both budget links cascade on delete.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Label shown when a transfer has no destination budget.
pub const USED_FUNDS_LABEL: &str = "Used Funds";

/// Internal transfer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "internal_transfers")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Budget the money leaves
    pub source_budget_id: i64,
    /// Budget the money enters, `None` for used funds
    pub destination_budget_id: Option<i64>,
    /// Always positive, in cents
    pub amount_cents: i64,
    /// Date of the transfer
    pub transfer_date: Date,
    /// Free-text note
    pub description: String,
    /// When the transfer was created
    pub created_at: DateTimeUtc,
    /// When the transfer was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Amount in dollars.
    #[must_use]
    pub fn amount_dollars(&self) -> f64 {
        crate::core::money::cents_to_dollars(self.amount_cents)
    }
}

/// Defines relationships between transfers and budgets
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Outgoing side
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::SourceBudgetId",
        to = "super::budget::Column::Id",
        on_delete = "Cascade"
    )]
    SourceBudget,
    /// Incoming side
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::DestinationBudgetId",
        to = "super::budget::Column::Id",
        on_delete = "Cascade"
    )]
    DestinationBudget,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
