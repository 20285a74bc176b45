//! Account form.

use super::{FieldErrors, lenient_string, max_length, non_negative_amount, required};
use serde::Deserialize;

/// Longest account name accepted
pub const ACCOUNT_NAME_MAX_LENGTH: usize = 64;

/// Raw account input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountForm {
    /// Display name
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Current balance in dollars
    #[serde(default, deserialize_with = "lenient_string")]
    pub starting_balance: Option<String>,
}

/// Validated account input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedAccount {
    /// Display name
    pub name: String,
    /// Starting balance in cents
    pub starting_balance_cents: i64,
}

impl AccountForm {
    /// Name is required and short; the balance may be zero but not negative.
    pub fn validate(&self) -> Result<CleanedAccount, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", self.name.as_deref())
            .filter(|n| max_length(&mut errors, "name", n, ACCOUNT_NAME_MAX_LENGTH));
        let starting_balance_cents = non_negative_amount(
            &mut errors,
            "starting_balance",
            self.starting_balance.as_deref(),
        );
        match (name, starting_balance_cents) {
            (Some(name), Some(starting_balance_cents)) => Ok(CleanedAccount {
                name,
                starting_balance_cents,
            }),
            _ => Err(errors),
        }
    }
}

/// Raw balance snapshot input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceForm {
    /// Current balance in dollars
    #[serde(default, deserialize_with = "lenient_string")]
    pub balance: Option<String>,
}

impl BalanceForm {
    /// Returns the balance in cents; same rules as the starting balance.
    pub fn validate(&self) -> Result<i64, FieldErrors> {
        let mut errors = FieldErrors::new();
        non_negative_amount(&mut errors, "balance", self.balance.as_deref()).ok_or(errors)
    }
}
