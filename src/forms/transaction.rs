//! Transaction form.

use super::{
    FieldErrors, add_error, lenient_string, max_length, optional_int, positive_amount, required,
    required_date,
};
use crate::entities::TransactionType;
use chrono::NaiveDate;
use serde::Deserialize;

/// Longest category name accepted by transactions and budgets.
pub const CATEGORY_MAX_LENGTH: usize = 100;

/// Parses a TransactionType name, recording `message` on failure.
pub(crate) fn transaction_type(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    message: &str,
) -> Option<TransactionType> {
    let raw = required(errors, field, value)?;
    TransactionType::from_name(&raw).or_else(|| {
        add_error(errors, field, message);
        None
    })
}

/// Parses a required category of at most [`CATEGORY_MAX_LENGTH`] characters.
pub(crate) fn category(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    let category = required(errors, field, value)?;
    max_length(errors, field, &category, CATEGORY_MAX_LENGTH).then_some(category)
}

/// Raw transaction input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    /// TransactionType name, e.g. `"NEED"`
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub transaction_type: Option<String>,
    /// Category name
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    /// Dollar amount, e.g. `"12.50"`
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_of_expense: Option<String>,
    /// Optional account id
    #[serde(default, deserialize_with = "lenient_string")]
    pub account_id: Option<String>,
}

/// Validated transaction input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedTransaction {
    /// Classification
    pub transaction_type: TransactionType,
    /// Category name
    pub category: String,
    /// Amount in cents, always positive
    pub amount_cents: i64,
    /// Date the money moved
    pub date_of_expense: NaiveDate,
    /// Optional account link
    pub account_id: Option<i64>,
}

impl TransactionForm {
    /// Validates every field and collects all errors.
    pub fn validate(&self) -> Result<CleanedTransaction, FieldErrors> {
        let mut errors = FieldErrors::new();

        let transaction_type = transaction_type(
            &mut errors,
            "type",
            self.transaction_type.as_deref(),
            "Invalid transaction type.",
        );
        let category = category(&mut errors, "category", self.category.as_deref());
        let amount_cents = positive_amount(&mut errors, "amount", self.amount.as_deref());
        let date_of_expense =
            required_date(&mut errors, "date_of_expense", self.date_of_expense.as_deref());
        let account_id = optional_int(&mut errors, "account_id", self.account_id.as_deref());

        match (transaction_type, category, amount_cents, date_of_expense) {
            (Some(transaction_type), Some(category), Some(amount_cents), Some(date_of_expense))
                if errors.is_empty() =>
            {
                Ok(CleanedTransaction {
                    transaction_type,
                    category,
                    amount_cents,
                    date_of_expense,
                    account_id,
                })
            }
            _ => Err(errors),
        }
    }
}
