//! Enumerations stored as string columns.
//!
//! Each enum maps to the upper-case name persisted in the database and carries a
//! human readable label used in reports and email content.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification shared by transactions and budgets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money coming in
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Necessary spending
    #[sea_orm(string_value = "NEED")]
    Need,
    /// Discretionary spending
    #[sea_orm(string_value = "WANT")]
    Want,
    /// Debt repayment
    #[sea_orm(string_value = "DEBTS")]
    Debts,
    /// Money set aside
    #[sea_orm(string_value = "SAVINGS")]
    Savings,
    /// Money invested
    #[sea_orm(string_value = "INVESTING")]
    Investing,
}

impl TransactionType {
    /// All types in display order.
    pub const ALL: [Self; 6] = [
        Self::Income,
        Self::Need,
        Self::Want,
        Self::Debts,
        Self::Savings,
        Self::Investing,
    ];

    /// Types counted as spending.
    pub const SPENDING: [Self; 3] = [Self::Need, Self::Want, Self::Debts];

    /// Types counted as saving.
    pub const SAVING: [Self; 2] = [Self::Savings, Self::Investing];

    /// Persisted name, e.g. `"INCOME"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Need => "NEED",
            Self::Want => "WANT",
            Self::Debts => "DEBTS",
            Self::Savings => "SAVINGS",
            Self::Investing => "INVESTING",
        }
    }

    /// Display label, e.g. `"Income"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Need => "Need",
            Self::Want => "Want",
            Self::Debts => "Debts",
            Self::Savings => "Savings",
            Self::Investing => "Investing",
        }
    }

    /// Parses a persisted name. Matching is exact, so `"income"` is rejected.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// True for every type except INCOME.
    #[must_use]
    pub const fn is_outflow(self) -> bool {
        !matches!(self, Self::Income)
    }
}

/// Kind of a catalog category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Spending category
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Income category
    #[sea_orm(string_value = "income")]
    Income,
}

impl CategoryKind {
    /// Parses `"income"` / `"expense"`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Persisted name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// The four scheduled emails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailType {
    /// Nudge for users who logged nothing in the last week
    #[sea_orm(string_value = "WEEKLY_REMINDER")]
    WeeklyReminder,
    /// Seven-day spending summary
    #[sea_orm(string_value = "WEEKLY_SUMMARY")]
    WeeklySummary,
    /// Current month summary
    #[sea_orm(string_value = "MONTHLY_SUMMARY")]
    MonthlySummary,
    /// Year in review
    #[sea_orm(string_value = "YEARLY_SUMMARY")]
    YearlySummary,
}

impl EmailType {
    /// Display label, e.g. `"Weekly Reminder"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WeeklyReminder => "Weekly Reminder",
            Self::WeeklySummary => "Weekly Summary",
            Self::MonthlySummary => "Monthly Summary",
            Self::YearlySummary => "Yearly Summary",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_names_round_trip() {
        for t in TransactionType::ALL {
            assert_eq!(TransactionType::from_name(t.name()), Some(t));
        }
        assert_eq!(TransactionType::from_name("income"), None);
        assert_eq!(TransactionType::from_name("INVALID_TYPE"), None);
    }

    #[test]
    fn test_only_income_is_not_outflow() {
        assert!(!TransactionType::Income.is_outflow());
        assert!(TransactionType::Savings.is_outflow());
    }

    #[test]
    fn test_category_kind_parse() {
        assert_eq!(CategoryKind::from_name("income"), Some(CategoryKind::Income));
        assert_eq!(CategoryKind::from_name("expense"), Some(CategoryKind::Expense));
        assert_eq!(CategoryKind::from_name("all"), None);
    }
}
