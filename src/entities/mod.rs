//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod account_balance;
pub mod budget;
pub mod budget_allocation;
pub mod category;
pub mod email_log;
pub mod internal_transfer;
pub mod sea_orm_active_enums;
pub mod session;
pub mod system_state;
pub mod transaction;
pub mod user;
pub mod user_settings;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use account_balance::{
    Column as AccountBalanceColumn, Entity as AccountBalance, Model as AccountBalanceModel,
};
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use budget_allocation::{
    Column as BudgetAllocationColumn, Entity as BudgetAllocation, Model as BudgetAllocationModel,
};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use email_log::{Column as EmailLogColumn, Entity as EmailLog, Model as EmailLogModel};
pub use internal_transfer::{
    Column as InternalTransferColumn, Entity as InternalTransfer, Model as InternalTransferModel,
};
pub use sea_orm_active_enums::{CategoryKind, EmailType, TransactionType};
pub use session::{Column as SessionColumn, Entity as Session, Model as SessionModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_settings::{
    Column as UserSettingsColumn, Entity as UserSettings, Model as UserSettingsModel,
};
