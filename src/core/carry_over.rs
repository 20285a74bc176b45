//! Month-end carry-over processing
//!
//! When a budget allows carry-over, whatever it did not use by the end of its
//! month is copied into the same slot of the following month as
//! `carried_over_cents`. The unused amount is
//!
//! `max(0, amount + carried_over + net transfers - spent)`
//!
//! where `spent` sums the user's transactions of the same type and category in
//! that month. Processing is idempotent: a second run for the same month finds
//! every next-month budget already holding the computed value and skips it.

use super::budget::{BudgetSlot, find_budget_in_slot, get_budgets_for_month, insert_budget};
use super::period::{next_month, previous_month};
use super::transaction::sum_for_slot;
use crate::{
    entities::{Budget, InternalTransfer, TransactionType, budget, internal_transfer},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QuerySelect, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, warn};

/// What happened to the next month's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CarryOverAction {
    /// The next month's slot was empty and has been created
    Created,
    /// The next month's slot held a different carry-over
    Updated,
    /// The next month's slot already held the computed value
    Skipped,
}

/// Outcome for a single budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetCarryOver {
    /// Budget that was closed out
    pub budget_id: i64,
    /// Category name
    pub category: String,
    /// Budget type
    #[serde(rename = "type")]
    pub budget_type: TransactionType,
    /// Cents carried into next month
    pub carry_over_cents: i64,
    /// Budget in the next month that received it
    pub next_budget_id: i64,
    /// What was done to that budget
    pub action: CarryOverAction,
}

/// Counters for one user's month-end run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CarryOverResult {
    /// Budgets with carry-over enabled
    pub processed: usize,
    /// Next-month budgets created
    pub created: usize,
    /// Next-month budgets whose carry-over changed
    pub updated: usize,
    /// Next-month budgets already up to date
    pub skipped: usize,
    /// Per budget detail
    pub budgets_processed: Vec<BudgetCarryOver>,
}

impl CarryOverResult {
    fn record(&mut self, entry: BudgetCarryOver) {
        self.processed += 1;
        match entry.action {
            CarryOverAction::Created => self.created += 1,
            CarryOverAction::Updated => self.updated += 1,
            CarryOverAction::Skipped => self.skipped += 1,
        }
        self.budgets_processed.push(entry);
    }
}

/// Incoming minus outgoing transfer cents for a budget.
///
/// A budget row is scoped to one month, so this covers that month's transfers.
pub async fn calculate_net_transfers_for_budget<C>(db: &C, budget: &budget::Model) -> Result<i64>
where
    C: ConnectionTrait,
{
    let incoming: i64 = InternalTransfer::find()
        .filter(internal_transfer::Column::DestinationBudgetId.eq(budget.id))
        .select_only()
        .column(internal_transfer::Column::AmountCents)
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .sum();
    let outgoing: i64 = InternalTransfer::find()
        .filter(internal_transfer::Column::SourceBudgetId.eq(budget.id))
        .select_only()
        .column(internal_transfer::Column::AmountCents)
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .sum();
    Ok(incoming - outgoing)
}

/// Unused cents of a budget at the end of its month, floored at zero.
pub async fn calculate_carry_over_amount<C>(db: &C, budget: &budget::Model) -> Result<i64>
where
    C: ConnectionTrait,
{
    let net_transfers = calculate_net_transfers_for_budget(db, budget).await?;
    let spent = sum_for_slot(
        db,
        budget.user_id,
        budget.budget_type,
        &budget.category,
        budget.budget_year,
        budget.month(),
    )
    .await?;

    Ok((budget.amount_cents + budget.carried_over_cents + net_transfers - spent).max(0))
}

/// Carry-over flowing INTO (year, month) for a slot.
///
/// This is the computed carry-over of the previous month's budget in the same
/// slot when that budget allows carry-over, and zero otherwise.
pub async fn calculate_carry_over_for_budget<C>(
    db: &C,
    user_id: i64,
    category: &str,
    budget_type: TransactionType,
    year: i32,
    month: u32,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    let (prev_year, prev_month) = previous_month(year, month);
    let previous = find_budget_in_slot(
        db,
        &BudgetSlot {
            user_id,
            category,
            budget_type,
            year: prev_year,
            month: prev_month,
        },
    )
    .await?;

    match previous {
        Some(budget) if budget.allow_carry_over => calculate_carry_over_amount(db, &budget).await,
        _ => Ok(0),
    }
}

/// Closes out one user's month and writes the carry-overs into the next month.
///
/// All writes happen in one database transaction.
///
/// # Arguments
/// * `db` - Database connection
/// * `user_id` - Whose budgets to process
/// * `year`, `month` - The month being closed
pub async fn process_month_end_carry_over(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<CarryOverResult> {
    let (next_year, next) = next_month(year, month);
    let txn = db.begin().await?;
    let mut result = CarryOverResult::default();

    let budgets = get_budgets_for_month(&txn, user_id, year, month).await?;
    for budget in budgets.into_iter().filter(|b| b.allow_carry_over) {
        let carry_over_cents = calculate_carry_over_amount(&txn, &budget).await?;
        let slot = BudgetSlot {
            user_id,
            category: &budget.category,
            budget_type: budget.budget_type,
            year: next_year,
            month: next,
        };

        let (next_budget_id, action) = match find_budget_in_slot(&txn, &slot).await? {
            None => {
                let created = insert_budget(
                    &txn,
                    &slot,
                    budget.amount_cents,
                    budget.allow_carry_over,
                    carry_over_cents,
                )
                .await?;
                (created.id, CarryOverAction::Created)
            }
            Some(existing) if existing.carried_over_cents != carry_over_cents => {
                let id = existing.id;
                let mut active: budget::ActiveModel = existing.into();
                active.carried_over_cents = Set(carry_over_cents);
                active.updated_at = Set(Utc::now());
                active.update(&txn).await?;
                (id, CarryOverAction::Updated)
            }
            Some(existing) => (existing.id, CarryOverAction::Skipped),
        };

        result.record(BudgetCarryOver {
            budget_id: budget.id,
            category: budget.category.clone(),
            budget_type: budget.budget_type,
            carry_over_cents,
            next_budget_id,
            action,
        });
    }

    txn.commit().await?;

    if result.processed > 0 {
        info!(
            user_id,
            year,
            month,
            processed = result.processed,
            created = result.created,
            updated = result.updated,
            skipped = result.skipped,
            "Month-end carry-over processed"
        );
    }
    Ok(result)
}

/// Runs [`process_month_end_carry_over`] for every user with a carry-over
/// budget in (year, month). A failure for one user is logged and the rest
/// continue.
pub async fn process_all_users_carry_over(
    db: &DatabaseConnection,
    year: i32,
    month: u32,
) -> Result<Vec<(i64, CarryOverResult)>> {
    let user_ids: Vec<i64> = Budget::find()
        .filter(budget::Column::BudgetYear.eq(year))
        .filter(budget::Column::BudgetMonth.eq(i32::try_from(month)?))
        .filter(budget::Column::AllowCarryOver.eq(true))
        .select_only()
        .column(budget::Column::UserId)
        .distinct()
        .into_tuple::<i64>()
        .all(db)
        .await?;

    let mut results = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        match process_month_end_carry_over(db, user_id, year, month).await {
            Ok(result) => results.push((user_id, result)),
            Err(e) => warn!(user_id, year, month, error = %e, "Carry-over failed for user"),
        }
    }
    Ok(results)
}

/// Formats a carry-over result into a one-paragraph summary for logs.
#[must_use]
pub fn format_carry_over_summary(year: i32, month: u32, result: &CarryOverResult) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Carry-over - {} - Processed {} budgets ({} created, {} updated, {} skipped)",
        super::period::format_month_year(year, month),
        result.processed,
        result.created,
        result.updated,
        result.skipped
    );
    for entry in &result.budgets_processed {
        let _ = write!(
            summary,
            "\n  {} ({}): {}",
            entry.category,
            entry.budget_type.name(),
            super::money::format_dollars(entry.carry_over_cents)
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{
        create_test_budget, create_test_transaction, create_test_transfer, create_test_user, date,
        setup_test_db,
    };

    async fn next_budget(
        db: &DatabaseConnection,
        user_id: i64,
        t: TransactionType,
        category: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<budget::Model>> {
        find_budget_in_slot(
            db,
            &BudgetSlot {
                user_id,
                category,
                budget_type: t,
                year,
                month,
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_processes_budget_with_surplus() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            30_000,
            date(2025, 1, 15),
        )
        .await?;

        let result = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        assert_eq!(result.processed, 1);
        assert_eq!(result.created, 1);

        let feb = next_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            2025,
            2,
        )
        .await?
        .unwrap();
        assert_eq!(feb.carried_over_cents, 70_000);
        assert_eq!(feb.amount_cents, 100_000);
        assert!(feb.allow_carry_over);
        Ok(())
    }

    #[tokio::test]
    async fn test_deficit_carries_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            150_000,
            date(2025, 1, 15),
        )
        .await?;

        let result = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        assert_eq!(result.created, 1);
        let feb = next_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            2025,
            2,
        )
        .await?
        .unwrap();
        assert_eq!(feb.carried_over_cents, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_skips_budget_without_carry_over() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Need,
            "Groceries",
            50_000,
            2025,
            1,
            false,
        )
        .await?;

        let result = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        assert_eq!(result.processed, 0);
        assert!(
            next_budget(&db, user.id, TransactionType::Need, "Groceries", 2025, 2).await?.is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_year_boundary() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Investing,
            "Index Fund",
            200_000,
            2025,
            12,
            true,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Investing,
            "Index Fund",
            100_000,
            date(2025, 12, 15),
        )
        .await?;

        let result = process_month_end_carry_over(&db, user.id, 2025, 12).await?;
        assert_eq!(result.created, 1);
        let jan = next_budget(
            &db,
            user.id,
            TransactionType::Investing,
            "Index Fund",
            2026,
            1,
        )
        .await?
        .unwrap();
        assert_eq!(jan.carried_over_cents, 100_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_updates_existing_next_month_budget() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Vacation",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Vacation",
            100_000,
            2025,
            2,
            true,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "Vacation",
            25_000,
            date(2025, 1, 20),
        )
        .await?;

        let result = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        assert_eq!((result.processed, result.created, result.updated), (1, 0, 1));
        let feb = next_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Vacation",
            2025,
            2,
        )
        .await?
        .unwrap();
        assert_eq!(feb.carried_over_cents, 75_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_transfers_counted_once_each_side() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        let source = create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
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
        create_test_transfer(
            &db,
            user.id,
            source.id,
            Some(dest.id),
            20_000,
            date(2025, 1, 10),
        )
        .await?;

        assert_eq!(calculate_net_transfers_for_budget(&db, &source).await?, -20_000);
        assert_eq!(calculate_net_transfers_for_budget(&db, &dest).await?, 20_000);

        let result = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        assert_eq!(result.processed, 2);
        let emergency = next_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            2025,
            2,
        )
        .await?
        .unwrap();
        let vacation = next_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Vacation",
            2025,
            2,
        )
        .await?
        .unwrap();
        assert_eq!(emergency.carried_over_cents, 80_000);
        assert_eq!(vacation.carried_over_cents, 70_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_used_funds_transfer_reduces_source_only() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        let source = create_test_budget(
            &db,
            user.id,
            TransactionType::Want,
            "Fun",
            10_000,
            2025,
            1,
            true,
        )
        .await?;
        create_test_transfer(&db, user.id, source.id, None, 4_000, date(2025, 1, 10)).await?;

        assert_eq!(calculate_carry_over_amount(&db, &source).await?, 6_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_chain_across_months() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "House Down Payment",
            200_000,
            2025,
            1,
            true,
        )
        .await?;
        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "House Down Payment",
            50_000,
            date(2025, 1, 15),
        )
        .await?;

        process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        let feb = next_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "House Down Payment",
            2025,
            2,
        )
        .await?
        .unwrap();
        assert_eq!(feb.carried_over_cents, 150_000);

        create_test_transaction(
            &db,
            user.id,
            TransactionType::Savings,
            "House Down Payment",
            30_000,
            date(2025, 2, 10),
        )
        .await?;
        process_month_end_carry_over(&db, user.id, 2025, 2).await?;
        let mar = next_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "House Down Payment",
            2025,
            3,
        )
        .await?
        .unwrap();
        assert_eq!(mar.carried_over_cents, 200_000 + 150_000 - 30_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_isolates_users() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        let other = create_test_user(&db, "otheruser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Savings",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
        create_test_budget(
            &db,
            other.id,
            TransactionType::Savings,
            "Savings",
            200_000,
            2025,
            1,
            true,
        )
        .await?;

        let result = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        assert_eq!(result.processed, 1);
        assert!(
            next_budget(
                &db,
                other.id,
                TransactionType::Savings,
                "Savings",
                2025,
                2,
            )
            .await?
            .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_idempotency() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            100_000,
            2025,
            1,
            true,
        )
        .await?;

        let first = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        let second = process_month_end_carry_over(&db, user.id, 2025, 1).await?;
        assert_eq!((first.processed, first.created), (1, 1));
        assert_eq!((second.processed, second.created, second.skipped), (1, 0, 1));

        let count = Budget::find()
            .filter(budget::Column::UserId.eq(user.id))
            .filter(budget::Column::BudgetMonth.eq(2))
            .count(&db)
            .await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_carry_over_into_month() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "testuser").await?;
        create_test_budget(
            &db,
            user.id,
            TransactionType::Savings,
            "Emergency Fund",
            100_000,
            2025,
            1,
            true,
        )
        .await?;
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

        assert_eq!(
            calculate_carry_over_for_budget(
                &db,
                user.id,
                "Emergency Fund",
                TransactionType::Savings,
                2025,
                2,
            )
            .await?,
            100_000
        );
        assert_eq!(
            calculate_carry_over_for_budget(
                &db,
                user.id,
                "Rent",
                TransactionType::Need,
                2025,
                2,
            )
            .await?,
            0
        );
        assert_eq!(
            calculate_carry_over_for_budget(
                &db,
                user.id,
                "Missing",
                TransactionType::Want,
                2025,
                2,
            )
            .await?,
            0
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_all_users() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let carol = create_test_user(&db, "carol").await?;
        create_test_budget(
            &db,
            alice.id,
            TransactionType::Savings,
            "A",
            1_000,
            2025,
            3,
            true,
        )
        .await?;
        create_test_budget(&db, bob.id, TransactionType::Savings, "B", 2_000, 2025, 3, true).await?;
        create_test_budget(&db, carol.id, TransactionType::Need, "C", 3_000, 2025, 3, false).await?;

        let results = process_all_users_carry_over(&db, 2025, 3).await?;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.created == 1));

        let summary = format_carry_over_summary(2025, 3, &results[0].1);
        assert!(summary.starts_with("Carry-over - March 2025 - Processed 1 budgets"));
        Ok(())
    }
}
