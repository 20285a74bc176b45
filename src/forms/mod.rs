//! Form validation.
//!
//! Each form is a plain `Deserialize` struct whose fields arrive as optional
//! strings from a urlencoded body or JSON. `validate` turns it into a cleaned
//! value or a [`FieldErrors`] map keyed by field name, with [`NON_FIELD_ERRORS`]
//! for errors that span several fields.

use crate::core::money::{format_cents, parse_dollars_to_cents};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Account form
pub mod account;
/// Login and sign-up forms
pub mod auth;
/// Budget item, multi budget and allocation forms
pub mod budget;
/// Email preference form
pub mod settings;
/// Transaction form
pub mod transaction;
/// Internal transfer form
pub mod transfer;

/// Validation errors keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key for errors not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const ENTER_NUMBER: &str = "Enter a number.";
pub(crate) const ENTER_WHOLE_NUMBER: &str = "Enter a whole number.";
pub(crate) const ENTER_DATE: &str = "Enter a valid date.";
pub(crate) const AMOUNT_POSITIVE: &str = "Amount must be greater than zero.";

/// Largest amount a form accepts, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 2_147_483_647;

/// Appends a message to a field's error list.
pub fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Returns the trimmed value, or records "required" when it is missing or blank.
pub(crate) fn required(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            add_error(errors, field, REQUIRED);
            None
        }
    }
}

/// Checks a character limit on an already cleaned value.
pub(crate) fn max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> bool {
    let len = value.chars().count();
    if len > max {
        add_error(
            errors,
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
        false
    } else {
        true
    }
}

/// Parses a required dollar amount that must be strictly positive.
pub(crate) fn positive_amount(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<i64> {
    let raw = required(errors, field, value)?;
    match parse_dollars_to_cents(&raw) {
        Some(cents) if cents > MAX_AMOUNT_CENTS => {
            add_error(errors, field, amount_too_large());
            None
        }
        Some(cents) if cents > 0 => Some(cents),
        Some(_) => {
            add_error(errors, field, AMOUNT_POSITIVE);
            None
        }
        None => {
            add_error(errors, field, ENTER_NUMBER);
            None
        }
    }
}

/// Parses a required dollar amount that may be zero.
pub(crate) fn non_negative_amount(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<i64> {
    let raw = required(errors, field, value)?;
    match parse_dollars_to_cents(&raw) {
        Some(cents) if cents > MAX_AMOUNT_CENTS => {
            add_error(errors, field, amount_too_large());
            None
        }
        Some(cents) if cents >= 0 => Some(cents),
        Some(_) => {
            add_error(errors, field, "Ensure this value is greater than or equal to 0.");
            None
        }
        None => {
            add_error(errors, field, ENTER_NUMBER);
            None
        }
    }
}

fn amount_too_large() -> String {
    format!(
        "Ensure this value is less than or equal to {}.",
        format_cents(MAX_AMOUNT_CENTS)
    )
}

/// Parses a required `YYYY-MM-DD` date.
pub(crate) fn required_date(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<NaiveDate> {
    let raw = required(errors, field, value)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_or_else(
        |_| {
            add_error(errors, field, ENTER_DATE);
            None
        },
        Some,
    )
}

/// Parses a required integer.
pub(crate) fn required_int<T: std::str::FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<T> {
    let raw = required(errors, field, value)?;
    raw.parse::<T>().map_or_else(
        |_| {
            add_error(errors, field, ENTER_WHOLE_NUMBER);
            None
        },
        Some,
    )
}

/// Parses an optional integer; blank means `None`.
pub(crate) fn optional_int<T: std::str::FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<T> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
    raw.parse::<T>().map_or_else(
        |_| {
            add_error(errors, field, ENTER_WHOLE_NUMBER);
            None
        },
        Some,
    )
}

/// Interprets a checkbox value. Missing means unchecked.
#[must_use]
pub fn checkbox(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

/// Accepts a string, number or bool and keeps it as text.
///
/// JSON clients send `"amount": 800.0` while HTML forms send `amount=800.00`;
/// both land in the same `Option<String>` field.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_flags_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "name", Some("  Rent ")), Some("Rent".to_string()));
        assert_eq!(required(&mut errors, "name", Some("   ")), None);
        assert_eq!(errors["name"], vec![REQUIRED.to_string()]);
    }

    #[test]
    fn test_positive_amount_messages() {
        let mut errors = FieldErrors::new();
        assert_eq!(positive_amount(&mut errors, "amount", Some("12.50")), Some(1250));
        assert_eq!(positive_amount(&mut errors, "amount", Some("0.00")), None);
        assert_eq!(positive_amount(&mut errors, "amount", Some("abc")), None);
        assert_eq!(
            errors["amount"],
            vec![AMOUNT_POSITIVE.to_string(), ENTER_NUMBER.to_string()]
        );
    }

    #[test]
    fn test_amounts_are_capped() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            positive_amount(&mut errors, "amount", Some("21474836.47")),
            Some(MAX_AMOUNT_CENTS)
        );
        assert_eq!(positive_amount(&mut errors, "amount", Some("21474836.48")), None);
        assert_eq!(
            non_negative_amount(&mut errors, "balance", Some("90000000000000000")),
            None
        );
        assert_eq!(errors["amount"].len(), 1);
        assert!(errors["amount"][0].starts_with("Ensure this value is less than or equal to"));
        assert_eq!(errors["balance"].len(), 1);
    }

    #[test]
    fn test_checkbox_values() {
        assert!(checkbox(Some("on")));
        assert!(checkbox(Some("TRUE")));
        assert!(!checkbox(Some("off")));
        assert!(!checkbox(None));
    }
}
