//! Transaction list filtering and the context shown around the list.

use super::account::list_accounts;
use super::category::list_categories;
use super::dashboard::get_months_dashboard;
use super::period::{
    MonthOption, generate_year_options, get_month_options_with_names,
    get_user_transaction_date_range, month_bounds, month_name,
};
use crate::{
    entities::{
        AccountModel, CategoryKind, CategoryModel, Transaction, TransactionModel, TransactionType,
        transaction,
    },
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Select, prelude::*};
use serde::{Deserialize, Serialize};

/// Value meaning "no filter" for the string filters.
pub const ALL: &str = "all";

/// Query string of the transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionFilters {
    /// Year, defaults to the current one
    pub year: Option<i32>,
    /// Month, defaults to the current one
    pub month: Option<u32>,
    /// `income`, `expense` or `all`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Category name or `all`
    pub category: Option<String>,
    /// Account id or `all`
    pub account: Option<String>,
}

/// Filters with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFilters {
    /// Selected year
    pub year: i32,
    /// Selected month
    pub month: u32,
    /// Selected kind
    pub kind: String,
    /// Selected category
    pub category: String,
    /// Selected account
    pub account: String,
}

impl TransactionFilters {
    /// Fills missing values from `today` and `all`.
    #[must_use]
    pub fn resolve(&self, today: NaiveDate) -> ResolvedFilters {
        let or_all = |v: &Option<String>| {
            v.clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| ALL.to_string())
        };
        ResolvedFilters {
            year: self.year.unwrap_or_else(|| today.year()),
            month: self.month.unwrap_or_else(|| today.month()),
            kind: or_all(&self.kind),
            category: or_all(&self.category),
            account: or_all(&self.account),
        }
    }
}

/// Restricts to one calendar month.
pub fn filter_by_date(
    query: Select<Transaction>,
    year: i32,
    month: u32,
) -> Result<Select<Transaction>> {
    let (start, end) = month_bounds(year, month)?;
    Ok(query.filter(transaction::Column::DateOfExpense.between(start, end)))
}

/// `income` keeps INCOME transactions, `expense` keeps the rest.
#[must_use]
pub fn filter_by_type(query: Select<Transaction>, kind: &str) -> Select<Transaction> {
    match CategoryKind::from_name(kind) {
        Some(CategoryKind::Income) => {
            query.filter(transaction::Column::TransactionType.eq(TransactionType::Income))
        }
        Some(CategoryKind::Expense) => {
            query.filter(transaction::Column::TransactionType.ne(TransactionType::Income))
        }
        None => query,
    }
}

/// Keeps one category name.
#[must_use]
pub fn filter_by_category(query: Select<Transaction>, category: &str) -> Select<Transaction> {
    if category == ALL {
        query
    } else {
        query.filter(transaction::Column::Category.eq(category))
    }
}

/// Keeps one account. A value that is not an id matches nothing.
#[must_use]
pub fn filter_by_account(query: Select<Transaction>, account: &str) -> Select<Transaction> {
    if account == ALL {
        return query;
    }
    match account.parse::<i64>() {
        Ok(id) => query.filter(transaction::Column::AccountId.eq(id)),
        Err(_) => query.filter(transaction::Column::Id.eq(-1)),
    }
}

/// The user's transactions matching every filter, newest first.
pub async fn apply_all_filters(
    db: &DatabaseConnection,
    user_id: i64,
    filters: &ResolvedFilters,
) -> Result<Vec<TransactionModel>> {
    let query = Transaction::find().filter(transaction::Column::UserId.eq(user_id));
    let query = filter_by_date(query, filters.year, filters.month)?;
    let query = filter_by_type(query, &filters.kind);
    let query = filter_by_category(query, &filters.category);
    filter_by_account(query, &filters.account)
        .order_by_desc(transaction::Column::DateOfExpense)
        .order_by_desc(transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Dropdown options and current selections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterContext {
    /// Years with data
    pub years: Vec<i32>,
    /// All months
    pub months: Vec<MonthOption>,
    /// Income catalog
    pub income_categories: Vec<CategoryModel>,
    /// Expense catalog
    pub expense_categories: Vec<CategoryModel>,
    /// User's accounts
    pub accounts: Vec<AccountModel>,
    /// Current selection
    pub selected: ResolvedFilters,
}

/// Full transaction list page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionListContext {
    /// Filter dropdowns
    #[serde(flatten)]
    pub filters: FilterContext,
    /// Matching transactions
    pub transactions: Vec<TransactionModel>,
    /// Name of the selected month
    pub month_name: &'static str,
    /// Month income
    pub total_income: Decimal,
    /// Month expenses
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`
    pub net_income: Decimal,
}

/// Builds the dropdown options for the transaction list.
pub async fn build_filter_context(
    db: &DatabaseConnection,
    user_id: i64,
    selected: ResolvedFilters,
    today: NaiveDate,
) -> Result<FilterContext> {
    let (min_date, max_date) = get_user_transaction_date_range(db, user_id).await?;
    Ok(FilterContext {
        years: generate_year_options(min_date, max_date, today),
        months: get_month_options_with_names(),
        income_categories: list_categories(db, Some(CategoryKind::Income)).await?,
        expense_categories: list_categories(db, Some(CategoryKind::Expense)).await?,
        accounts: list_accounts(db, user_id).await?,
        selected,
    })
}

/// Filters the list and adds the filter options and month totals. The totals
/// cover the whole month regardless of the type, category and account filters.
pub async fn build_transaction_list_context(
    db: &DatabaseConnection,
    user_id: i64,
    filters: &TransactionFilters,
    today: NaiveDate,
) -> Result<TransactionListContext> {
    let resolved = filters.resolve(today);
    let transactions = apply_all_filters(db, user_id, &resolved).await?;
    let dashboard = get_months_dashboard(db, user_id, resolved.year, resolved.month).await?;
    let month = resolved.month;

    Ok(TransactionListContext {
        filters: build_filter_context(db, user_id, resolved, today).await?,
        transactions,
        month_name: month_name(month),
        total_income: dashboard.total_income,
        total_expenses: dashboard.total_expenses,
        net_income: dashboard.net_income,
    })
}
