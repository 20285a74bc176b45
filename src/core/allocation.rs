//! Budget allocations - splitting one budget across catalog categories.
//!
//! Allocations are zero-based: a saved set always adds up to the budget's
//! amount. Spent figures are derived from the user's transactions in the
//! budget's month whose category name matches the catalog category.

use super::budget::get_user_budget;
use super::calculator::BudgetStatus;
use super::money::cents_to_dollars;
use super::period::month_bounds;
use crate::{
    entities::{
        Budget, BudgetAllocation, Category, Transaction, budget, budget_allocation, category,
        transaction,
    },
    errors::{Error, Result},
    forms::budget::{AllocationForm, CleanedAllocation},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// One allocation with its derived figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationView {
    /// Allocation id
    pub id: i64,
    /// Catalog category id
    pub category_id: i64,
    /// Catalog category name
    pub category: String,
    /// Dollars allocated this month
    pub allocated: f64,
    /// Dollars rolled in from last month
    pub rollover: f64,
    /// `allocated + rollover`
    pub available: f64,
    /// Dollars spent this month
    pub spent: f64,
    /// `available - spent`
    pub remaining: f64,
    /// Spent share of available, 0 when nothing is available
    pub percent_spent: f64,
    /// Progress status
    pub status: BudgetStatus,
}

/// Totals across a budget's allocations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    /// Budget id
    pub budget_id: i64,
    /// Budget amount in dollars
    pub budget_amount: f64,
    /// Sum of allocations
    pub total_allocated: f64,
    /// Sum of rollovers
    pub total_rollover: f64,
    /// `total_allocated + total_rollover`
    pub total_available: f64,
    /// Sum of spending
    pub total_spent: f64,
    /// `total_available - total_spent`
    pub total_remaining: f64,
    /// Spent share of available
    pub percent_spent: f64,
    /// Overall status
    pub status: BudgetStatus,
    /// Per category rows
    pub allocations: Vec<AllocationView>,
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Cents spent per category name in the budget's month.
async fn spending_by_category<C>(db: &C, budget: &budget::Model) -> Result<HashMap<String, i64>>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(budget.budget_year, budget.month())?;
    let rows = Transaction::find()
        .filter(transaction::Column::UserId.eq(budget.user_id))
        .filter(transaction::Column::DateOfExpense.between(start, end))
        .all(db)
        .await?;

    let mut spent: HashMap<String, i64> = HashMap::new();
    for row in rows {
        *spent.entry(row.category).or_default() += row.amount_cents;
    }
    Ok(spent)
}

async fn allocations_with_categories<C>(
    db: &C,
    budget_id: i64,
) -> Result<Vec<(budget_allocation::Model, Option<category::Model>)>>
where
    C: ConnectionTrait,
{
    BudgetAllocation::find()
        .filter(budget_allocation::Column::BudgetId.eq(budget_id))
        .find_also_related(Category)
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Replaces all allocations of an owned budget.
///
/// The rows must add up to the budget amount. Existing rollovers are kept for
/// categories that remain allocated.
pub async fn replace_allocations(
    db: &DatabaseConnection,
    user_id: i64,
    budget_id: i64,
    form: &AllocationForm,
) -> Result<Vec<budget_allocation::Model>> {
    let budget = get_user_budget(db, user_id, budget_id).await?;
    let cleaned = form.validate(budget.amount_cents)?;

    let category_ids: Vec<i64> = cleaned.iter().map(|a| a.category_id).collect();
    let known = Category::find()
        .filter(category::Column::Id.is_in(category_ids.clone()))
        .count(db)
        .await?;
    if usize::try_from(known)? != category_ids.len() {
        let missing = category_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        return Err(Error::not_found("Category", missing));
    }

    let txn = db.begin().await?;
    let previous: HashMap<i64, i64> = BudgetAllocation::find()
        .filter(budget_allocation::Column::BudgetId.eq(budget_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| (a.category_id, a.rollover_cents))
        .collect();
    BudgetAllocation::delete_many()
        .filter(budget_allocation::Column::BudgetId.eq(budget_id))
        .exec(&txn)
        .await?;

    let now = Utc::now();
    let mut saved = Vec::with_capacity(cleaned.len());
    for CleanedAllocation {
        category_id,
        allocated_cents,
    } in cleaned
    {
        let model = budget_allocation::ActiveModel {
            budget_id: Set(budget_id),
            category_id: Set(category_id),
            allocated_cents: Set(allocated_cents),
            rollover_cents: Set(previous.get(&category_id).copied().unwrap_or(0)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        saved.push(model);
    }
    txn.commit().await?;

    info!(user_id, budget_id, count = saved.len(), "Allocations replaced");
    Ok(saved)
}

/// Allocation totals and per category figures for an owned budget.
pub async fn get_budget_summary(
    db: &DatabaseConnection,
    user_id: i64,
    budget_id: i64,
) -> Result<BudgetSummary> {
    let budget = get_user_budget(db, user_id, budget_id).await?;
    let spent_by_category = spending_by_category(db, &budget).await?;
    let rows = allocations_with_categories(db, budget_id).await?;

    let (mut allocated_total, mut rollover_total, mut spent_total) = (0_i64, 0_i64, 0_i64);
    let mut allocations = Vec::with_capacity(rows.len());
    for (allocation, category) in rows {
        let name = category.map(|c| c.name).unwrap_or_default();
        let spent = spent_by_category.get(&name).copied().unwrap_or(0);
        let available = allocation.allocated_cents + allocation.rollover_cents;

        allocated_total += allocation.allocated_cents;
        rollover_total += allocation.rollover_cents;
        spent_total += spent;

        allocations.push(AllocationView {
            id: allocation.id,
            category_id: allocation.category_id,
            category: name,
            allocated: cents_to_dollars(allocation.allocated_cents),
            rollover: cents_to_dollars(allocation.rollover_cents),
            available: cents_to_dollars(available),
            spent: cents_to_dollars(spent),
            remaining: cents_to_dollars(available - spent),
            percent_spent: percent(spent, available),
            status: BudgetStatus::from_amounts(available, spent),
        });
    }

    let available_total = allocated_total + rollover_total;
    Ok(BudgetSummary {
        budget_id,
        budget_amount: cents_to_dollars(budget.amount_cents),
        total_allocated: cents_to_dollars(allocated_total),
        total_rollover: cents_to_dollars(rollover_total),
        total_available: cents_to_dollars(available_total),
        total_spent: cents_to_dollars(spent_total),
        total_remaining: cents_to_dollars(available_total - spent_total),
        percent_spent: percent(spent_total, available_total),
        status: BudgetStatus::from_amounts(available_total, spent_total),
        allocations,
    })
}

/// Budget amount not yet allocated, in cents.
pub async fn get_unallocated_amount(
    db: &DatabaseConnection,
    user_id: i64,
    budget_id: i64,
) -> Result<i64> {
    let budget = get_user_budget(db, user_id, budget_id).await?;
    let allocated: i64 = BudgetAllocation::find()
        .filter(budget_allocation::Column::BudgetId.eq(budget_id))
        .all(db)
        .await?
        .iter()
        .map(|a| a.allocated_cents)
        .sum();
    Ok(budget.amount_cents - allocated)
}

/// Allocations of the most recent earlier budget in the same slot, as
/// `category_id -> allocated cents`. Used to prefill a new month.
pub async fn get_previous_allocations(
    db: &DatabaseConnection,
    user_id: i64,
    budget_id: i64,
) -> Result<HashMap<i64, i64>> {
    let budget = get_user_budget(db, user_id, budget_id).await?;
    let previous = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Category.eq(budget.category.as_str()))
        .filter(budget::Column::BudgetType.eq(budget.budget_type))
        .filter(
            Condition::any()
                .add(budget::Column::BudgetYear.lt(budget.budget_year))
                .add(
                    Condition::all()
                        .add(budget::Column::BudgetYear.eq(budget.budget_year))
                        .add(budget::Column::BudgetMonth.lt(budget.budget_month)),
                ),
        )
        .order_by_desc(budget::Column::BudgetYear)
        .order_by_desc(budget::Column::BudgetMonth)
        .one(db)
        .await?;

    let Some(previous) = previous else {
        return Ok(HashMap::new());
    };
    Ok(BudgetAllocation::find()
        .filter(budget_allocation::Column::BudgetId.eq(previous.id))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.category_id, a.allocated_cents))
        .collect())
}

/// Moves each allocation's positive remainder from one budget into the
/// matching allocation of another as `rollover_cents`.
///
/// Missing target allocations are created with nothing allocated.
///
/// # Returns
/// Number of allocations that received a rollover.
pub async fn process_allocation_rollover(
    db: &DatabaseConnection,
    user_id: i64,
    from_budget_id: i64,
    to_budget_id: i64,
) -> Result<usize> {
    let from = get_user_budget(db, user_id, from_budget_id).await?;
    get_user_budget(db, user_id, to_budget_id).await?;
    let spent_by_category = spending_by_category(db, &from).await?;
    let rows = allocations_with_categories(db, from_budget_id).await?;

    let txn = db.begin().await?;
    let now = Utc::now();
    let mut rolled = 0;
    for (allocation, category) in rows {
        let name = category.map(|c| c.name).unwrap_or_default();
        let spent = spent_by_category.get(&name).copied().unwrap_or(0);
        let remaining = allocation.allocated_cents + allocation.rollover_cents - spent;
        if remaining <= 0 {
            continue;
        }

        let existing = BudgetAllocation::find()
            .filter(budget_allocation::Column::BudgetId.eq(to_budget_id))
            .filter(budget_allocation::Column::CategoryId.eq(allocation.category_id))
            .one(&txn)
            .await?;
        if let Some(existing) = existing {
            let mut active: budget_allocation::ActiveModel = existing.into();
            active.rollover_cents = Set(remaining);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        } else {
            budget_allocation::ActiveModel {
                budget_id: Set(to_budget_id),
                category_id: Set(allocation.category_id),
                allocated_cents: Set(0),
                rollover_cents: Set(remaining),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        rolled += 1;
    }
    txn.commit().await?;

    info!(user_id, from_budget_id, to_budget_id, rolled, "Allocation rollover processed");
    Ok(rolled)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{CategoryKind, TransactionType};
    use crate::forms::budget::AllocationRow;
    use crate::test_utils::{
        create_test_budget, create_test_category, create_test_transaction, create_test_user, date,
        setup_test_db,
    };

    fn form(rows: &[(i64, &str)]) -> AllocationForm {
        AllocationForm {
            allocations: rows
                .iter()
                .map(|(id, amount)| AllocationRow {
                    category_id: Some(id.to_string()),
                    amount: Some((*amount).to_string()),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_replace_and_summarise() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let groceries = create_test_category(&db, "Groceries", CategoryKind::Expense).await?;
        let dining = create_test_category(&db, "Dining Out", CategoryKind::Expense).await?;
        let budget = create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            100_000,
            2025,
            3,
            false,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Groceries",
            45_000,
            date(2025, 3, 5),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Want,
            "Dining Out",
            5_000,
            date(2025, 3, 6),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Groceries",
            99_999,
            date(2025, 4, 1),
        )
        .await?;

        let saved = replace_allocations(
            &db,
            user.id,
            budget.id,
            &form(&[(groceries.id, "500"), (dining.id, "500")]),
        )
        .await?;
        assert_eq!(saved.len(), 2);

        let summary = get_budget_summary(&db, user.id, budget.id).await?;
        assert!((summary.total_allocated - 1000.0).abs() < f64::EPSILON);
        assert!((summary.total_spent - 500.0).abs() < f64::EPSILON);
        assert_eq!(summary.status, BudgetStatus::OnTrack);

        let dining_row = summary.allocations.iter().find(|a| a.category == "Dining Out").unwrap();
        assert_eq!(dining_row.status, BudgetStatus::OnTrack);
        let groceries_row = summary.allocations.iter().find(|a| a.category == "Groceries").unwrap();
        assert_eq!(groceries_row.status, BudgetStatus::Warning);

        assert_eq!(get_unallocated_amount(&db, user.id, budget.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unbalanced_allocations_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let groceries = create_test_category(&db, "Groceries", CategoryKind::Expense).await?;
        let budget = create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            100_000,
            2025,
            3,
            false,
        )
        .await?;

        let result = replace_allocations(
            &db,
            user.id,
            budget.id,
            &form(&[(groceries.id, "400")]),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(get_unallocated_amount(&db, user.id, budget.id).await?, 100_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let budget = create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            100_000,
            2025,
            3,
            false,
        )
        .await?;

        let result = replace_allocations(&db, user.id, budget.id, &form(&[(999, "1000")])).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Category", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_and_previous_allocations() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let groceries = create_test_category(&db, "Groceries", CategoryKind::Expense).await?;
        let dining = create_test_category(&db, "Dining Out", CategoryKind::Expense).await?;
        let march = create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            100_000,
            2025,
            3,
            false,
        )
        .await?;
        let april = create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            100_000,
            2025,
            4,
            false,
        )
        .await?;
        replace_allocations(
            &db,
            user.id,
            march.id,
            &form(&[(groceries.id, "600"), (dining.id, "400")]),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Need,
            "Groceries",
            45_000,
            date(2025, 3, 5),
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Want,
            "Dining Out",
            50_000,
            date(2025, 3, 6),
        )
        .await?;

        let previous = get_previous_allocations(&db, user.id, april.id).await?;
        assert_eq!(previous.get(&groceries.id), Some(&60_000));

        let rolled = process_allocation_rollover(&db, user.id, march.id, april.id).await?;
        assert_eq!(rolled, 1);

        let summary = get_budget_summary(&db, user.id, april.id).await?;
        assert_eq!(summary.allocations.len(), 1);
        assert!((summary.allocations[0].rollover - 150.0).abs() < f64::EPSILON);
        Ok(())
    }
}
