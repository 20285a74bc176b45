//! Calendar month arithmetic and the date range options offered by filters.

use crate::{
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;

/// English month names, index 0 is January.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Validates a (year, month) pair.
pub fn validate_period(year: i32, month: u32) -> Result<()> {
    if (1..=12).contains(&month) && NaiveDate::from_ymd_opt(year, month, 1).is_some() {
        Ok(())
    } else {
        Err(Error::InvalidPeriod { year, month })
    }
}

/// The month after (year, month). December rolls into January of the next year.
#[must_use]
pub const fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// The month before (year, month). January rolls back into December.
#[must_use]
pub const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// First and last day of a month, inclusive.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(Error::InvalidPeriod { year, month })?;
    let (next_year, next) = next_month(year, month);
    let last = NaiveDate::from_ymd_opt(next_year, next, 1)
        .and_then(|d| d.pred_opt())
        .ok_or(Error::InvalidPeriod { year, month })?;
    Ok((first, last))
}

/// First and last day of a year, inclusive.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(Error::InvalidPeriod { year, month: 1 })?;
    let last =
        NaiveDate::from_ymd_opt(year, 12, 31).ok_or(Error::InvalidPeriod { year, month: 12 })?;
    Ok((first, last))
}

/// Month name for 1-12, empty for anything else.
#[must_use]
pub fn month_name(month: u32) -> &'static str {
    usize::try_from(month)
        .ok()
        .and_then(|m| m.checked_sub(1))
        .and_then(|i| MONTH_NAMES.get(i))
        .copied()
        .unwrap_or("")
}

/// "Month YYYY", e.g. "March 2025".
#[must_use]
pub fn format_month_year(year: i32, month: u32) -> String {
    format!("{} {year}", month_name(month))
}

/// One entry of a month dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthOption {
    /// 1-12
    pub value: u32,
    /// "January" ..
    pub name: &'static str,
}

/// Earliest and latest transaction dates of a user.
pub async fn get_user_transaction_date_range(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let first = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_asc(transaction::Column::DateOfExpense)
        .select_only()
        .column(transaction::Column::DateOfExpense)
        .into_tuple::<NaiveDate>()
        .one(db)
        .await?;
    let last = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::DateOfExpense)
        .select_only()
        .column(transaction::Column::DateOfExpense)
        .into_tuple::<NaiveDate>()
        .one(db)
        .await?;
    Ok((first, last))
}

/// Years offered in filters: the span of the user's transactions, or the
/// previous and current year when there are none.
#[must_use]
pub fn generate_year_options(
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<i32> {
    match (min_date, max_date) {
        (Some(min), Some(max)) => (min.year()..=max.year()).collect(),
        _ => (today.year() - 1..=today.year()).collect(),
    }
}

/// All twelve months with their names.
#[must_use]
pub fn get_month_options_with_names() -> Vec<MonthOption> {
    (1..=12)
        .map(|value| MonthOption {
            value,
            name: month_name(value),
        })
        .collect()
}
