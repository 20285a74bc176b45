//! Category catalog - list categories and seed the default catalog.

use crate::{
    config::categories::CategoryConfig,
    entities::{Category, CategoryKind, category},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of a catalog seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrepopulateResult {
    /// Categories inserted
    pub created: usize,
    /// Categories that already existed
    pub skipped: usize,
}

/// Inserts a catalog category.
pub async fn create_category<C>(
    db: &C,
    name: &str,
    kind: CategoryKind,
    vendor: Option<String>,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    category::ActiveModel {
        name: Set(name.to_string()),
        kind: Set(kind),
        vendor: Set(vendor),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Lists categories ordered by name, optionally restricted to one kind.
pub async fn list_categories(
    db: &DatabaseConnection,
    kind: Option<CategoryKind>,
) -> Result<Vec<category::Model>> {
    let mut query = Category::find();
    if let Some(kind) = kind {
        query = query.filter(category::Column::Kind.eq(kind));
    }
    query
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts each configured category unless a category with the same name and
/// kind already exists. Safe to run on every startup.
pub async fn prepopulate_categories(
    db: &DatabaseConnection,
    catalog: &[CategoryConfig],
) -> Result<PrepopulateResult> {
    let mut result = PrepopulateResult::default();
    for entry in catalog {
        let exists = Category::find()
            .filter(category::Column::Name.eq(entry.name.as_str()))
            .filter(category::Column::Kind.eq(entry.kind))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!(name = %entry.name, kind = entry.kind.name(), "Category already exists");
            result.skipped += 1;
            continue;
        }
        create_category(db, &entry.name, entry.kind, None).await?;
        result.created += 1;
    }

    info!(created = result.created, skipped = result.skipped, "Category catalog seeded");
    Ok(result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::categories::default_categories;
    use crate::test_utils::{create_test_category, setup_test_db};

    #[tokio::test]
    async fn test_prepopulate_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = default_categories();

        let first = prepopulate_categories(&db, &catalog).await?;
        assert_eq!(first.created, 25);
        assert_eq!(first.skipped, 0);

        let second = prepopulate_categories(&db, &catalog).await?;
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 25);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_by_kind() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_category(&db, "Salary", CategoryKind::Income).await?;
        create_test_category(&db, "Rent", CategoryKind::Expense).await?;
        create_test_category(&db, "Groceries", CategoryKind::Expense).await?;

        let expense = list_categories(&db, Some(CategoryKind::Expense)).await?;
        let names: Vec<_> = expense.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "Rent"]);

        assert_eq!(list_categories(&db, None).await?.len(), 3);
        Ok(())
    }
}
