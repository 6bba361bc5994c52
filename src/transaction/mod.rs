//! Transactions and the ledger that keeps account balances in step with them.
//!
//! This module contains:
//! - The `Transaction` model and the `TransactionDraft` used to create and replace transactions
//! - The ledger operations that write transactions and adjust account balances atomically
//! - Queries for listing transactions and the API endpoints built on them

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod ledger;
mod list_endpoint;

pub use core::{
    TransactionDetails, TransactionDraft, TransactionFilter, TransactionId,
    account_has_transactions, category_has_transactions, create_transaction_table,
    get_transaction_details, list_transactions,
};
#[cfg(test)]
pub use core::{TransactionType, count_transactions};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use ledger::{create_transaction, delete_transaction, update_transaction};
pub use list_endpoint::{get_transaction_endpoint, list_transactions_endpoint};
