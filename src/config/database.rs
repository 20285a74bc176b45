//! Database configuration module for Clink Finance.
//!
//! Handles `SQLite` connection setup and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models. Composite unique constraints that
//! the entity derive cannot express are added as separate indexes.

use crate::entities::{
    Account, AccountBalance, Budget, BudgetAllocation, BudgetAllocationColumn, BudgetColumn,
    Category, CategoryColumn, EmailLog, InternalTransfer, Session, SystemState, Transaction,
    User, UserSettings,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default database location when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/clink.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Returns the directory holding a file-backed `SQLite` database, if any.
///
/// `sqlite::memory:` and non-sqlite URLs yield `None`.
#[must_use]
pub fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next()?;
    let parent = Path::new(path).parent()?;
    (!parent.as_os_str().is_empty()).then_some(parent)
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// For file-backed `SQLite` databases the parent directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();

    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }

    info!(url = %database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_budgets_user_slot")
            .table(Budget)
            .col(BudgetColumn::UserId)
            .col(BudgetColumn::Category)
            .col(BudgetColumn::BudgetType)
            .col(BudgetColumn::BudgetYear)
            .col(BudgetColumn::BudgetMonth)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_budget_allocations_budget_category")
            .table(BudgetAllocation)
            .col(BudgetAllocationColumn::BudgetId)
            .col(BudgetAllocationColumn::CategoryId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_categories_name_kind")
            .table(Category)
            .col(CategoryColumn::Name)
            .col(CategoryColumn::Kind)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates every table and unique index. Safe to call on an existing database.
///
/// Parent tables are created before the tables that reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Session).await?;
    create_table(db, &schema, Account).await?;
    create_table(db, &schema, AccountBalance).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, Budget).await?;
    create_table(db, &schema, BudgetAllocation).await?;
    create_table(db, &schema, InternalTransfer).await?;
    create_table(db, &schema, UserSettings).await?;
    create_table(db, &schema, EmailLog).await?;
    create_table(db, &schema, SystemState).await?;

    let builder = db.get_database_backend();
    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    debug!("Database schema is up to date");
    Ok(())
}
