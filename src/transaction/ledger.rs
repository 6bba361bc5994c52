//! Keeps account balances consistent with the transactions that touch them.
//!
//! Every mutation runs in a single unit of work that writes the transaction
//! row and adjusts the balance of each account it involves. An update first
//! reverses the stored effect and then applies the new one, so changing the
//! amount, type or accounts of a transaction moves money exactly once.

use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    Error, Money,
    account::{AccountId, adjust_balance, get_account},
    auth::AuthContext,
    category::{CategoryType, get_category},
    db::run_in_unit_of_work,
    transaction::core::{
        Transaction, TransactionDraft, TransactionId, TransactionKind, TransactionType,
        ValidatedTransaction, get_transaction, insert_transaction, overwrite_transaction,
        remove_transaction,
    },
    user::UserID,
};

/// The part an account plays in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The account named by `account_id`.
    Source,
    /// The account named by `to_account_id`, only transfers have one.
    Destination,
}

/// Whether an effect adds money to or takes money from an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Credit,
    Debit,
}

impl Sign {
    /// The signed change in balance for `amount`.
    pub fn apply(self, amount: Money) -> Money {
        match self {
            Sign::Credit => amount,
            Sign::Debit => -amount,
        }
    }
}

/// How a transaction of `transaction_type` changes the balance of the account in `role`.
///
/// Returns `None` when that type of transaction has no account in that role.
pub fn effect(transaction_type: TransactionType, role: Role) -> Option<Sign> {
    match (transaction_type, role) {
        (TransactionType::Income, Role::Source) => Some(Sign::Credit),
        (TransactionType::Expense, Role::Source) => Some(Sign::Debit),
        (TransactionType::Transfer, Role::Source) => Some(Sign::Debit),
        (TransactionType::Transfer, Role::Destination) => Some(Sign::Credit),
        (TransactionType::Income | TransactionType::Expense, Role::Destination) => None,
    }
}

/// The balance changes a transaction causes, as `(account, signed amount)` pairs.
pub fn balance_effects(
    kind: &TransactionKind,
    account_id: AccountId,
    amount: Money,
) -> Vec<(AccountId, Money)> {
    let transaction_type = kind.transaction_type();

    [
        (Role::Source, Some(account_id)),
        (Role::Destination, kind.to_account_id()),
    ]
    .into_iter()
    .filter_map(|(role, maybe_account_id)| {
        let account_id = maybe_account_id?;
        let sign = effect(transaction_type, role)?;

        Some((account_id, sign.apply(amount)))
    })
    .collect()
}

/// The balance changes that undo `effects`.
pub fn reverse_effects(effects: &[(AccountId, Money)]) -> Vec<(AccountId, Money)> {
    effects
        .iter()
        .map(|&(account_id, delta)| (account_id, -delta))
        .collect()
}

fn stored_effects(transaction: &Transaction) -> Vec<(AccountId, Money)> {
    balance_effects(&transaction.kind, transaction.account_id, transaction.amount)
}

fn apply_effects(
    user_id: UserID,
    effects: &[(AccountId, Money)],
    connection: &Connection,
) -> Result<(), Error> {
    for &(account_id, delta) in effects {
        adjust_balance(user_id, account_id, delta, connection)?;
    }

    Ok(())
}

/// Check that the accounts and category of `transaction` belong to `user_id`
/// and that the category has the same type as the transaction.
fn check_references(
    user_id: UserID,
    transaction: &ValidatedTransaction,
    connection: &Connection,
) -> Result<(), Error> {
    get_account(user_id, transaction.account_id, connection)?;

    let expected_category_type = match transaction.kind {
        TransactionKind::Transfer { to_account_id } => {
            get_account(user_id, to_account_id, connection)?;
            return Ok(());
        }
        TransactionKind::Income { .. } => CategoryType::Income,
        TransactionKind::Expense { .. } => CategoryType::Expense,
    };

    if let Some(category_id) = transaction.kind.category_id() {
        let category = get_category(user_id, category_id, connection)?;

        if category.category_type != expected_category_type {
            return Err(Error::Validation(format!(
                "category {category_id} is an {} category and cannot be used for {}",
                category.category_type,
                transaction.kind.transaction_type()
            )));
        }
    }

    Ok(())
}

/// Record a new transaction and apply its effect to the balances of its accounts.
///
/// A draft without a date is dated `today`.
///
/// # Errors
/// Returns:
/// - [Error::Validation] or [Error::InvalidAmount] if the draft is invalid or
///   the category type does not match the transaction type,
/// - [Error::MissingAccount] or [Error::MissingCategory] if a reference does
///   not belong to the user,
/// - [Error::SqlError] if an SQL related error occurred.
///
/// Nothing is written if an error is returned.
pub fn create_transaction(
    auth: &AuthContext,
    draft: TransactionDraft,
    today: Date,
    connection: &mut Connection,
) -> Result<TransactionId, Error> {
    let transaction = draft.validate()?;
    let transaction_date = transaction.transaction_date.unwrap_or(today);

    run_in_unit_of_work(connection, |unit| {
        check_references(auth.user_id, &transaction, unit)?;

        let transaction_id = insert_transaction(
            auth.user_id,
            &transaction,
            transaction_date,
            OffsetDateTime::now_utc(),
            unit,
        )?;

        let effects = balance_effects(&transaction.kind, transaction.account_id, transaction.amount);
        apply_effects(auth.user_id, &effects, unit)?;

        Ok(transaction_id)
    })
}

/// Replace a transaction with `draft` and move its effect on account balances accordingly.
///
/// A draft without a date keeps the stored date.
///
/// # Errors
/// Returns the same errors as [create_transaction], and
/// [Error::MissingTransaction] if there is no such transaction for the user.
/// On error the stored transaction and all balances are left unchanged.
pub fn update_transaction(
    auth: &AuthContext,
    transaction_id: TransactionId,
    draft: TransactionDraft,
    connection: &mut Connection,
) -> Result<Transaction, Error> {
    let transaction = draft.validate()?;

    run_in_unit_of_work(connection, |unit| {
        let stored = get_transaction(auth.user_id, transaction_id, unit)?;
        apply_effects(auth.user_id, &reverse_effects(&stored_effects(&stored)), unit)?;

        check_references(auth.user_id, &transaction, unit)?;

        let transaction_date = transaction
            .transaction_date
            .unwrap_or(stored.transaction_date);
        overwrite_transaction(
            auth.user_id,
            transaction_id,
            &transaction,
            transaction_date,
            unit,
        )?;

        let effects = balance_effects(&transaction.kind, transaction.account_id, transaction.amount);
        apply_effects(auth.user_id, &effects, unit)?;

        get_transaction(auth.user_id, transaction_id, unit)
    })
}

/// Delete a transaction and undo its effect on account balances.
///
/// # Errors
/// Returns [Error::MissingTransaction] if there is no such transaction for the user.
pub fn delete_transaction(
    auth: &AuthContext,
    transaction_id: TransactionId,
    connection: &mut Connection,
) -> Result<(), Error> {
    run_in_unit_of_work(connection, |unit| {
        let stored = get_transaction(auth.user_id, transaction_id, unit)?;
        apply_effects(auth.user_id, &reverse_effects(&stored_effects(&stored)), unit)?;

        remove_transaction(auth.user_id, transaction_id, unit)
    })
}
