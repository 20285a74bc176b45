//! Framework-agnostic business logic.
//!
//! Every operation takes a database connection and the acting user's id, and
//! returns [`crate::errors::Result`]. Objects owned by another user are
//! reported as not found.

/// Accounts and balance snapshots
pub mod account;
/// Per-category allocations inside a budget
pub mod allocation;
/// Users, passwords and sessions
pub mod auth;
/// Budget CRUD and availability
pub mod budget;
/// Pure calculations over transactions and budgets
pub mod calculator;
/// Month-end carry-over reconciliation
pub mod carry_over;
/// Category catalog
pub mod category;
/// Home page and monthly summaries
pub mod dashboard;
/// Transaction list filters
pub mod filter;
/// Cents and dollars
pub mod money;
/// Calendar months and dropdown options
pub mod period;
/// Email preferences
pub mod settings;
/// Scheduler bookkeeping
pub mod system_state;
/// Transaction CRUD and queries
pub mod transaction;
/// Internal transfers between budgets
pub mod transfer;
/// Year in review aggregation
pub mod year_review;
