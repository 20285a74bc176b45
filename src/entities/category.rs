//! Category entity - the shared catalog of income and expense categories.

use super::sea_orm_active_enums::CategoryKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category name, e.g. "Groceries"
    pub name: String,
    /// Income or expense
    pub kind: CategoryKind,
    /// Optional vendor tag
    pub vendor: Option<String>,
    /// When the category was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A category can be allocated in many budgets
    #[sea_orm(has_many = "super::budget_allocation::Entity")]
    Allocations,
}

impl Related<super::budget_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
