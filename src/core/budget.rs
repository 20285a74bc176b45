//! Budget business logic - envelopes keyed by (user, category, type, year, month).
//!
//! A slot holds at most one budget. Creating into an occupied slot updates the
//! existing row instead, mirroring an "update or create" on the unique key.

use super::carry_over::{calculate_carry_over_for_budget, calculate_net_transfers_for_budget};
use super::period::validate_period;
use crate::{
    entities::{
        Budget, BudgetAllocation, InternalTransfer, TransactionType, budget, budget_allocation,
        internal_transfer,
    },
    errors::{Error, Result},
    forms::{
        FieldErrors, NON_FIELD_ERRORS, add_error,
        budget::{CleanedBudgetItem, CleanedMultiBudget},
    },
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info};

/// Identifies a budget slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSlot<'a> {
    /// Owner
    pub user_id: i64,
    /// Category name
    pub category: &'a str,
    /// Budget type
    pub budget_type: TransactionType,
    /// Year
    pub year: i32,
    /// Month 1-12
    pub month: u32,
}

/// Finds the budget occupying a slot.
pub async fn find_budget_in_slot<C>(db: &C, slot: &BudgetSlot<'_>) -> Result<Option<budget::Model>>
where
    C: ConnectionTrait,
{
    Budget::find()
        .filter(budget::Column::UserId.eq(slot.user_id))
        .filter(budget::Column::Category.eq(slot.category))
        .filter(budget::Column::BudgetType.eq(slot.budget_type))
        .filter(budget::Column::BudgetYear.eq(slot.year))
        .filter(budget::Column::BudgetMonth.eq(i32::try_from(slot.month)?))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a new budget row.
pub async fn insert_budget<C>(
    db: &C,
    slot: &BudgetSlot<'_>,
    amount_cents: i64,
    allow_carry_over: bool,
    carried_over_cents: i64,
) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    validate_period(slot.year, slot.month)?;
    if amount_cents <= 0 {
        return Err(Error::InvalidAmount {
            amount: amount_cents,
        });
    }

    let now = Utc::now();
    budget::ActiveModel {
        user_id: Set(slot.user_id),
        budget_type: Set(slot.budget_type),
        category: Set(slot.category.to_string()),
        amount_cents: Set(amount_cents),
        budget_year: Set(slot.year),
        budget_month: Set(i32::try_from(slot.month)?),
        allow_carry_over: Set(allow_carry_over),
        carried_over_cents: Set(carried_over_cents.max(0)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates the slot's budget or updates its amount and carry-over flag.
///
/// # Returns
/// The budget and `true` when a new row was created.
pub async fn update_or_create_budget<C>(
    db: &C,
    user_id: i64,
    year: i32,
    month: u32,
    item: &CleanedBudgetItem,
) -> Result<(budget::Model, bool)>
where
    C: ConnectionTrait,
{
    let slot = BudgetSlot {
        user_id,
        category: &item.category,
        budget_type: item.budget_type,
        year,
        month,
    };

    if let Some(existing) = find_budget_in_slot(db, &slot).await? {
        let mut active: budget::ActiveModel = existing.into();
        active.amount_cents = Set(item.amount_cents);
        active.allow_carry_over = Set(item.allow_carry_over);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;
        debug!(user_id, budget_id = updated.id, "Budget slot updated");
        return Ok((updated, false));
    }

    let created = insert_budget(db, &slot, item.amount_cents, item.allow_carry_over, 0).await?;
    info!(
        user_id,
        budget_id = created.id,
        category = %created.category,
        kind = created.budget_type.name(),
        year,
        month,
        "Budget created"
    );
    Ok((created, true))
}

/// Saves a whole month of budgets atomically.
pub async fn save_multi_budget(
    db: &DatabaseConnection,
    user_id: i64,
    input: &CleanedMultiBudget,
) -> Result<Vec<budget::Model>> {
    let txn = db.begin().await?;
    let mut saved = Vec::with_capacity(input.items.len());
    for item in &input.items {
        let (model, _) = update_or_create_budget(
            &txn,
            user_id,
            input.year,
            input.month,
            item,
        )
        .await?;
        saved.push(model);
    }
    txn.commit().await?;

    info!(
        user_id,
        year = input.year,
        month = input.month,
        count = saved.len(),
        "Budget setup saved"
    );
    Ok(saved)
}

/// Fetches a budget only if it belongs to `user_id`.
pub async fn get_user_budget<C>(db: &C, user_id: i64, budget_id: i64) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    Budget::find_by_id(budget_id)
        .filter(budget::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Budget", budget_id))
}

/// Rewrites type, category, amount and carry-over flag of an owned budget.
///
/// Moving onto a slot already held by another budget is a validation error.
pub async fn update_budget(
    db: &DatabaseConnection,
    user_id: i64,
    budget_id: i64,
    item: &CleanedBudgetItem,
) -> Result<budget::Model> {
    let existing = get_user_budget(db, user_id, budget_id).await?;

    let target = BudgetSlot {
        user_id,
        category: &item.category,
        budget_type: item.budget_type,
        year: existing.budget_year,
        month: existing.month(),
    };
    let occupied = find_budget_in_slot(db, &target)
        .await?
        .is_some_and(|other| other.id != existing.id);
    if occupied {
        let mut errors = FieldErrors::new();
        add_error(
            &mut errors,
            NON_FIELD_ERRORS,
            "A budget for this category and type already exists for this month.",
        );
        return Err(errors.into());
    }

    let mut active: budget::ActiveModel = existing.into();
    active.budget_type = Set(item.budget_type);
    active.category = Set(item.category.clone());
    active.amount_cents = Set(item.amount_cents);
    active.allow_carry_over = Set(item.allow_carry_over);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes an owned budget together with its transfers and allocations.
///
/// Carry-over values already copied into other months stay as they are.
pub async fn delete_budget(db: &DatabaseConnection, user_id: i64, budget_id: i64) -> Result<()> {
    let existing = get_user_budget(db, user_id, budget_id).await?;

    let txn = db.begin().await?;
    let transfers = InternalTransfer::delete_many()
        .filter(
            Condition::any()
                .add(internal_transfer::Column::SourceBudgetId.eq(budget_id))
                .add(internal_transfer::Column::DestinationBudgetId.eq(budget_id)),
        )
        .exec(&txn)
        .await?;
    BudgetAllocation::delete_many()
        .filter(budget_allocation::Column::BudgetId.eq(budget_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;
    txn.commit().await?;

    info!(
        user_id,
        budget_id,
        transfers_removed = transfers.rows_affected,
        "Budget deleted"
    );
    Ok(())
}

/// Budgets of one month, ordered by category.
pub async fn get_budgets_for_month<C>(
    db: &C,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<budget::Model>>
where
    C: ConnectionTrait,
{
    Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::BudgetYear.eq(year))
        .filter(budget::Column::BudgetMonth.eq(i32::try_from(month)?))
        .order_by_asc(budget::Column::Category)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Budgets of one year.
pub async fn get_budgets_for_year(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
) -> Result<Vec<budget::Model>> {
    Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::BudgetYear.eq(year))
        .order_by_asc(budget::Column::BudgetMonth)
        .order_by_asc(budget::Column::Category)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Distinct category names budgeted for one type in a month, sorted.
pub async fn get_budget_categories(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
    budget_type: TransactionType,
) -> Result<Vec<String>> {
    Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::BudgetYear.eq(year))
        .filter(budget::Column::BudgetMonth.eq(i32::try_from(month)?))
        .filter(budget::Column::BudgetType.eq(budget_type))
        .select_only()
        .column(budget::Column::Category)
        .distinct()
        .order_by_asc(budget::Column::Category)
        .into_tuple::<String>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// A budget with the money it can actually draw on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetAvailability {
    /// Budget id
    pub id: i64,
    /// Category name
    pub category: String,
    /// Type name, e.g. `"NEED"`
    #[serde(rename = "type")]
    pub budget_type: TransactionType,
    /// Dollars available, formatted with two decimals
    pub available: String,
}

/// Every budget of a month with `available = amount + carry-over in + net transfers`.
pub async fn get_budgets_with_available(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<BudgetAvailability>> {
    let budgets = get_budgets_for_month(db, user_id, year, month).await?;
    let mut result = Vec::with_capacity(budgets.len());

    for budget in budgets {
        let carried_in = calculate_carry_over_for_budget(
            db,
            user_id,
            &budget.category,
            budget.budget_type,
            year,
            month,
        )
        .await?;
        let net_transfers = calculate_net_transfers_for_budget(db, &budget).await?;
        let available = budget.amount_cents + carried_in + net_transfers;

        result.push(BudgetAvailability {
            id: budget.id,
            category: budget.category,
            budget_type: budget.budget_type,
            available: super::money::format_cents(available),
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{
        create_test_budget, create_test_transfer, create_test_user, date, setup_test_db,
    };

    fn item(t: TransactionType, category: &str, cents: i64, carry: bool) -> CleanedBudgetItem {
        CleanedBudgetItem {
            budget_type: t,
            category: category.to_string(),
            amount_cents: cents,
            allow_carry_over: carry,
        }
    }

    #[tokio::test]
    async fn test_update_or_create_uses_the_slot() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;

        let (first, created) =
            update_or_create_budget(
                &db,
                user.id,
                2025,
                1,
                &item(TransactionType::Need, "Rent", 100_000, false),
            )
            .await?;
        assert!(created);

        let (second, created) =
            update_or_create_budget(
                &db,
                user.id,
                2025,
                1,
                &item(TransactionType::Need, "Rent", 120_000, true),
            )
            .await?;
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.amount_cents, 120_000);
        assert!(second.allow_carry_over);

        // Same category, different type is a different slot
        let (_, created) =
            update_or_create_budget(
                &db,
                user.id,
                2025,
                1,
                &item(TransactionType::Want, "Rent", 1_000, false),
            )
            .await?;
        assert!(created);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_multi_budget() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let saved = save_multi_budget(
            &db,
            user.id,
            &CleanedMultiBudget {
                year: 2025,
                month: 10,
                items: vec![
                    item(TransactionType::Income, "Salary", 195_640, false),
                    item(TransactionType::Need, "Housing", 80_000, false),
                ],
            },
        )
        .await?;
        assert_eq!(saved.len(), 2);
        assert_eq!(get_budgets_for_month(&db, user.id, 2025, 10).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_onto_occupied_slot_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Rent",
            100_000,
            2025,
            1,
            false,
        )
        .await?;
        let food = create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Food",
            40_000,
            2025,
            1,
            false,
        )
        .await?;

        let result = update_budget(
            &db,
            user.id,
            food.id,
            &item(TransactionType::Need, "Rent", 1, false),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_categories_distinct_and_sorted() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Utilities",
            1,
            2025,
            1,
            false,
        )
        .await?;
        create_test_budget(&db, user.id, TransactionType::Need, "Rent", 1, 2025, 1, false).await?;
        create_test_budget(&db, user.id, TransactionType::Want, "Games", 1, 2025, 1, false).await?;

        let categories = get_budget_categories(&db, user.id, 2025, 1, TransactionType::Need).await?;
        assert_eq!(categories, vec!["Rent".to_string(), "Utilities".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_cascades_transfers_but_not_copied_carry_over() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        let source = create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
        let dest = create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Vacation",
            50_000,
            2025,
            1,
            true,
        )
        .await?;
        let transfer = create_test_transfer(
            &db,
            user.id,
            source.id,
            Some(dest.id),
            20_000,
            date(2025, 1, 10),
        )
        .await?;

        crate::core::carry_over::process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        let feb = find_budget_in_slot(
            &db,
            &BudgetSlot {
                user_id: user.id,
                category: "Vacation",
                budget_type: TransactionType::Savings,
                year: 2025,
                month: 2,
            },
        )
        .await?
        .unwrap();
        assert_eq!(feb.carried_over_cents, 70_000);

        delete_budget(&db, user.id, dest.id).await?;

        assert!(InternalTransfer::find_by_id(transfer.id).one(&db).await?.is_none());
        assert_eq!(
            InternalTransfer::find()
                .filter(internal_transfer::Column::UserId.eq(user.id))
                .count(&db)
                .await?,
            0
        );
        let feb_after = get_user_budget(&db, user.id, feb.id).await?;
        assert_eq!(feb_after.carried_over_cents, 70_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_available_includes_carry_over_and_transfers() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "alice").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
        let feb = create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency",
            50_000,
            2025,
            2,
            true,
        )
        .await?;
        let fun = create_test_budget(
            &db,
            user.id,
            TransactionType::Want,
            "Fun",
            10_000,
            2025,
            2,
            false,
        )
        .await?;
        create_test_transfer(&db, user.id, feb.id, Some(fun.id), 5_000, date(2025, 2, 3)).await?;

        let available = get_budgets_with_available(&db, user.id, 2025, 2).await?;
        let emergency = available.iter().find(|b| b.id == feb.id).unwrap();
        // 500 + 1000 carried in - 50 transferred out
        assert_eq!(emergency.available, "1450.00");
        let fun_row = available.iter().find(|b| b.id == fun.id).unwrap();
        assert_eq!(fun_row.available, "150.00");
        Ok(())
    }
}
