//! Accounts and their balances.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub(crate) use core::adjust_balance;
pub use core::{
    Account, AccountEdit, AccountId, AccountSummary, AccountType, NewAccount, count_accounts,
    create_account, create_account_table, delete_account, get_account, get_account_summary,
    list_accounts, update_account,
};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use list_endpoint::{
    get_account_endpoint, get_account_summary_endpoint, list_accounts_endpoint,
};
