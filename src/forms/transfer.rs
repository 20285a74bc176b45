//! Internal transfer form.

use super::{
    FieldErrors, NON_FIELD_ERRORS, add_error, lenient_string, max_length, optional_int,
    positive_amount, required_date, required_int,
};
use chrono::NaiveDate;
use serde::Deserialize;

/// Longest transfer description accepted.
pub const DESCRIPTION_MAX_LENGTH: usize = 255;

/// Raw transfer input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InternalTransferForm {
    /// Budget the money leaves
    #[serde(default, deserialize_with = "lenient_string")]
    pub source_budget_id: Option<String>,
    /// Budget the money enters; blank for used funds
    #[serde(default, deserialize_with = "lenient_string")]
    pub destination_budget_id: Option<String>,
    /// Dollar amount
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, deserialize_with = "lenient_string")]
    pub transfer_date: Option<String>,
    /// Optional note
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

/// Validated transfer input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedTransfer {
    /// Budget the money leaves
    pub source_budget_id: i64,
    /// Budget the money enters
    pub destination_budget_id: Option<i64>,
    /// Amount in cents
    pub amount_cents: i64,
    /// Date of the transfer
    pub transfer_date: NaiveDate,
    /// Note, possibly empty
    pub description: String,
}

impl InternalTransferForm {
    /// Validates field formats and that source and destination differ.
    ///
    /// Ownership and the INCOME source rule need the stored budgets and are
    /// checked by `crate::core::transfer::create_transfer`.
    pub fn validate(&self) -> Result<CleanedTransfer, FieldErrors> {
        let mut errors = FieldErrors::new();

        let source_budget_id =
            required_int::<i64>(&mut errors, "source_budget_id", self.source_budget_id.as_deref());
        let destination_budget_id = optional_int::<i64>(
            &mut errors,
            "destination_budget_id",
            self.destination_budget_id.as_deref(),
        );
        let amount_cents = positive_amount(&mut errors, "amount", self.amount.as_deref());
        let transfer_date =
            required_date(&mut errors, "transfer_date", self.transfer_date.as_deref());
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        max_length(&mut errors, "description", &description, DESCRIPTION_MAX_LENGTH);

        if source_budget_id.is_some() && source_budget_id == destination_budget_id {
            add_error(
                &mut errors,
                NON_FIELD_ERRORS,
                "Source and destination budgets cannot be the same.",
            );
        }

        match (source_budget_id, amount_cents, transfer_date) {
            (Some(source_budget_id), Some(amount_cents), Some(transfer_date))
                if errors.is_empty() =>
            {
                Ok(CleanedTransfer {
                    source_budget_id,
                    destination_budget_id,
                    amount_cents,
                    transfer_date,
                    description,
                })
            }
            _ => Err(errors),
        }
    }
}
