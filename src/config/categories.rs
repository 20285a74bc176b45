//! Default category catalog.
//!
//! The catalog is seeded on startup. `[[categories]]` entries in config.toml
//! replace the built-in lists below.

use crate::entities::CategoryKind;
use serde::Deserialize;

/// Built-in expense categories
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 17] = [
    "Groceries",
    "Utilities",
    "Rent/Mortgage",
    "Subscriptions",
    "Health & Wellness",
    "Travel",
    "Transportation",
    "Bills",
    "Dining Out",
    "Entertainment",
    "Clothing",
    "Home Maintenance",
    "Insurance",
    "Education",
    "Personal Care",
    "Gifts & Donations",
    "Miscellaneous",
];

/// Built-in income categories
pub const DEFAULT_INCOME_CATEGORIES: [&str; 8] = [
    "Salary",
    "Freelance/Side Income",
    "Investment Returns",
    "Gifts Received",
    "Tax Refunds",
    "Emergency Fund",
    "Sinking Fund",
    "Other Income",
];

/// Configuration for a single catalog category
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Category name
    pub name: String,
    /// `income` or `expense`
    pub kind: CategoryKind,
}

/// The built-in catalog, expense categories first.
#[must_use]
pub fn default_categories() -> Vec<CategoryConfig> {
    let expense = DEFAULT_EXPENSE_CATEGORIES.iter().map(|name| CategoryConfig {
        name: (*name).to_string(),
        kind: CategoryKind::Expense,
    });
    let income = DEFAULT_INCOME_CATEGORIES.iter().map(|name| CategoryConfig {
        name: (*name).to_string(),
        kind: CategoryKind::Income,
    });
    expense.chain(income).collect()
}

/// Categories to seed: the configured list, or the built-in catalog when empty.
#[must_use]
pub fn categories_to_seed(configured: &[CategoryConfig]) -> Vec<CategoryConfig> {
    if configured.is_empty() {
        default_categories()
    } else {
        configured.to_vec()
    }
}
