//! Budget forms: a single budget item, a whole month of items, and the
//! allocation rows of one budget.

use super::transaction::{category, transaction_type};
use super::{
    FieldErrors, NON_FIELD_ERRORS, add_error, checkbox, lenient_string, non_negative_amount,
    positive_amount, required_int,
};
use crate::core::calculator::validate_zero_based_allocation;
use crate::core::money::{cents_to_decimal, format_cents};
use crate::entities::TransactionType;
use serde::Deserialize;
use std::collections::HashSet;

/// Earliest year accepted by [`MultiBudgetForm`].
pub const MIN_BUDGET_YEAR: i32 = 1900;

const INVALID_CHOICE: &str = "Select a valid choice.";

/// Raw input for one budget envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetItemForm {
    /// TransactionType name
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub budget_type: Option<String>,
    /// Category name
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    /// Planned dollar amount
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    /// Checkbox value
    #[serde(default, deserialize_with = "lenient_string")]
    pub allow_carry_over: Option<String>,
}

/// Validated budget envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedBudgetItem {
    /// Classification
    pub budget_type: TransactionType,
    /// Category name
    pub category: String,
    /// Planned amount in cents
    pub amount_cents: i64,
    /// Roll the remainder into next month
    pub allow_carry_over: bool,
}

impl BudgetItemForm {
    /// Validates the item, prefixing error keys with `prefix`.
    fn validate_into(&self, errors: &mut FieldErrors, prefix: &str) -> Option<CleanedBudgetItem> {
        let key = |field: &str| format!("{prefix}{field}");
        let before = errors.len();

        let budget_type = transaction_type(
            errors,
            &key("type"),
            self.budget_type.as_deref(),
            INVALID_CHOICE,
        );
        let category = category(errors, &key("category"), self.category.as_deref());
        let amount_cents = positive_amount(errors, &key("amount"), self.amount.as_deref());

        if errors.len() != before {
            return None;
        }
        Some(CleanedBudgetItem {
            budget_type: budget_type?,
            category: category?,
            amount_cents: amount_cents?,
            allow_carry_over: checkbox(self.allow_carry_over.as_deref()),
        })
    }

    /// Validates a standalone item.
    pub fn validate(&self) -> Result<CleanedBudgetItem, FieldErrors> {
        let mut errors = FieldErrors::new();
        self.validate_into(&mut errors, "").ok_or(errors)
    }
}

/// Raw input for a month of budgets
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiBudgetForm {
    /// Budget year
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    /// Budget month, 1-12
    #[serde(default, deserialize_with = "lenient_string")]
    pub month: Option<String>,
    /// One entry per envelope
    #[serde(default)]
    pub budgets: Vec<BudgetItemForm>,
}

/// Validated month of budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedMultiBudget {
    /// Budget year
    pub year: i32,
    /// Budget month
    pub month: u32,
    /// Envelopes, no two with the same (category, type)
    pub items: Vec<CleanedBudgetItem>,
}

/// Parses the year and month of a budget period.
fn budget_period(
    errors: &mut FieldErrors,
    year: Option<&str>,
    month: Option<&str>,
) -> (Option<i32>, Option<u32>) {
    let year = required_int::<i32>(errors, "year", year).filter(|year| {
        let ok = *year >= MIN_BUDGET_YEAR;
        if !ok {
            add_error(
                errors,
                "year",
                format!("Ensure this value is greater than or equal to {MIN_BUDGET_YEAR}."),
            );
        }
        ok
    });
    let month = required_int::<i64>(errors, "month", month)
        .filter(|month| {
            let ok = (1..=12).contains(month);
            if !ok {
                add_error(errors, "month", "Month must be between 1 and 12.");
            }
            ok
        })
        .and_then(|m| u32::try_from(m).ok());
    (year, month)
}

impl MultiBudgetForm {
    /// Validates the period, every item, and that no (category, type) pair repeats.
    pub fn validate(&self) -> Result<CleanedMultiBudget, FieldErrors> {
        let mut errors = FieldErrors::new();

        let (year, month) = budget_period(&mut errors, self.year.as_deref(), self.month.as_deref());

        if self.budgets.is_empty() {
            add_error(&mut errors, "budgets", "At least one budget item is required.");
        }

        let mut items = Vec::with_capacity(self.budgets.len());
        let mut seen: HashSet<(String, TransactionType)> = HashSet::new();
        for (index, item) in self.budgets.iter().enumerate() {
            let prefix = format!("budgets[{index}].");
            let Some(cleaned) = item.validate_into(&mut errors, &prefix) else {
                continue;
            };
            if !seen.insert((cleaned.category.clone(), cleaned.budget_type)) {
                add_error(
                    &mut errors,
                    NON_FIELD_ERRORS,
                    format!(
                        "Duplicate entry found: {} ({}) appears more than once.",
                        cleaned.category,
                        cleaned.budget_type.name()
                    ),
                );
                continue;
            }
            items.push(cleaned);
        }

        match (year, month) {
            (Some(year), Some(month)) if errors.is_empty() => Ok(CleanedMultiBudget {
                year,
                month,
                items,
            }),
            _ => Err(errors),
        }
    }
}

/// Raw input for one budget slot of a month
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetSlotForm {
    /// Budget year
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    /// Budget month, 1-12
    #[serde(default, deserialize_with = "lenient_string")]
    pub month: Option<String>,
    /// The envelope itself
    #[serde(flatten)]
    pub item: BudgetItemForm,
}

/// Validated budget slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedBudgetSlot {
    /// Budget year
    pub year: i32,
    /// Budget month
    pub month: u32,
    /// Envelope values
    pub item: CleanedBudgetItem,
}

impl BudgetSlotForm {
    /// Validates the period and the item together.
    pub fn validate(&self) -> Result<CleanedBudgetSlot, FieldErrors> {
        let mut errors = FieldErrors::new();
        let (year, month) = budget_period(&mut errors, self.year.as_deref(), self.month.as_deref());
        let item = self.item.validate_into(&mut errors, "");
        match (year, month, item) {
            (Some(year), Some(month), Some(item)) if errors.is_empty() => {
                Ok(CleanedBudgetSlot { year, month, item })
            }
            _ => Err(errors),
        }
    }
}

/// One allocation row
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllocationRow {
    /// Catalog category id
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: Option<String>,
    /// Dollar amount, may be zero
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
}

/// Raw allocation input for one budget
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllocationForm {
    /// Allocation rows
    #[serde(default)]
    pub allocations: Vec<AllocationRow>,
}

/// Validated allocation, amounts in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanedAllocation {
    /// Catalog category id
    pub category_id: i64,
    /// Amount in cents
    pub allocated_cents: i64,
}

impl AllocationForm {
    /// Validates the rows and checks they add up to `budget_cents` exactly.
    pub fn validate(&self, budget_cents: i64) -> Result<Vec<CleanedAllocation>, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut cleaned = Vec::with_capacity(self.allocations.len());
        let mut seen = HashSet::new();

        for (index, row) in self.allocations.iter().enumerate() {
            let prefix = format!("allocations[{index}].");
            let category_id = required_int::<i64>(
                &mut errors,
                &format!("{prefix}category_id"),
                row.category_id.as_deref(),
            );
            let amount = non_negative_amount(
                &mut errors,
                &format!("{prefix}amount"),
                row.amount.as_deref(),
            );
            let (Some(category_id), Some(allocated_cents)) = (category_id, amount) else {
                continue;
            };
            if !seen.insert(category_id) {
                add_error(
                    &mut errors,
                    NON_FIELD_ERRORS,
                    format!("Category '{category_id}' appears more than once."),
                );
                continue;
            }
            cleaned.push(CleanedAllocation {
                category_id,
                allocated_cents,
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let amounts: Vec<_> = cleaned
            .iter()
            .map(|a| cents_to_decimal(a.allocated_cents))
            .collect();
        if !validate_zero_based_allocation(&amounts, cents_to_decimal(budget_cents)) {
            let total: i64 = cleaned.iter().map(|a| a.allocated_cents).sum();
            let diff = budget_cents - total;
            let message = if diff > 0 {
                format!("You still have ${} unallocated.", format_cents(diff))
            } else {
                format!("You've over-allocated by ${}.", format_cents(-diff))
            };
            add_error(&mut errors, NON_FIELD_ERRORS, message);
            return Err(errors);
        }

        Ok(cleaned)
    }
}
