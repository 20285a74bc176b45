//! Budget allocation entity - part of a budget earmarked for one catalog category.
//!
//! Spent, remaining and percent-spent figures are computed on demand by
//! `crate::core::allocation` and never stored.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget allocation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_allocations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent budget
    pub budget_id: i64,
    /// Catalog category
    pub category_id: i64,
    /// Amount earmarked this month, in cents
    pub allocated_cents: i64,
    /// Remainder rolled in from the previous month's allocation, in cents
    pub rollover_cents: i64,
    /// When the allocation was created
    pub created_at: DateTimeUtc,
    /// When the allocation was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between allocations, budgets and categories
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each allocation belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id",
        on_delete = "Cascade"
    )]
    Budget,
    /// Each allocation targets one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    Category,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
