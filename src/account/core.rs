//! Accounts hold money and carry a balance that only the ledger may change.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Money, db::run_in_unit_of_work, transaction::account_has_transactions, user::UserID,
};

pub type AccountId = i64;

/// The icon given to accounts created without one.
pub const DEFAULT_ACCOUNT_ICON: &str = "wallet";
/// The color given to accounts created without one.
pub const DEFAULT_ACCOUNT_COLOR: &str = "#3498db";

/// What kind of store of money an account is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Cash,
    Bank,
    Ewallet,
    /// Money owed, e.g. a credit card or loan. Counts as a liability.
    Debt,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "cash",
            AccountType::Bank => "bank",
            AccountType::Ewallet => "ewallet",
            AccountType::Debt => "debt",
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(AccountType::Cash),
            "bank" => Ok(AccountType::Bank),
            "ewallet" => Ok(AccountType::Ewallet),
            "debt" => Ok(AccountType::Debt),
            other => Err(Error::Validation(format!(
                "account type must be one of cash, bank, ewallet or debt, got {other}"
            ))),
        }
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.into()))
    }
}

/// An account owned by a user.
///
/// `current_balance` always equals `initial_balance` plus the effects of the
/// account's transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub initial_balance: Money,
    pub current_balance: Money,
    pub icon: String,
    pub color: String,
}

/// The data for creating an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAccount {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// The balance the account starts with, zero if not given.
    #[serde(default)]
    pub initial_balance: Money,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewAccount {
    /// An account with the default icon and color.
    pub fn new(name: &str, account_type: AccountType, initial_balance: Money) -> Self {
        Self {
            name: name.to_owned(),
            account_type,
            initial_balance,
            icon: None,
            color: None,
        }
    }
}

/// Changes to an account's descriptive fields. Balances cannot be edited.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AccountEdit {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// The totals across all of a user's accounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    /// The sum of the balances of cash, bank and e-wallet accounts.
    pub total_assets: Money,
    /// The sum of the positive balances of debt accounts.
    pub total_liabilities: Money,
    pub net_worth: Money,
}

fn validate_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::Validation("account name cannot be empty".to_owned()))
    } else {
        Ok(name)
    }
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('cash', 'bank', 'ewallet', 'debt')),
            initial_balance INTEGER NOT NULL DEFAULT 0,
            current_balance INTEGER NOT NULL DEFAULT 0,
            icon TEXT NOT NULL DEFAULT 'wallet',
            color TEXT NOT NULL DEFAULT '#3498db',
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_user ON account(user_id)",
        (),
    )?;

    Ok(())
}

const ACCOUNT_COLUMNS: &str = "id, name, type, initial_balance, current_balance, icon, color";

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        account_type: row.get(2)?,
        initial_balance: row.get(3)?,
        current_balance: row.get(4)?,
        icon: row.get(5)?,
        color: row.get(6)?,
    })
}

/// Create an account for `user_id` whose current balance starts at its initial balance.
///
/// # Errors
/// Returns:
/// - [Error::Validation] if the name is empty,
/// - [Error::InvalidAmount] if the initial balance has more than two decimal places,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_account(
    user_id: UserID,
    new_account: NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_name(&new_account.name)?;
    new_account.initial_balance.check_precision()?;

    let icon = new_account
        .icon
        .unwrap_or_else(|| DEFAULT_ACCOUNT_ICON.to_owned());
    let color = new_account
        .color
        .unwrap_or_else(|| DEFAULT_ACCOUNT_COLOR.to_owned());

    connection.execute(
        "INSERT INTO account (user_id, name, type, initial_balance, current_balance, icon, color)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6)",
        (
            user_id.as_i64(),
            name,
            new_account.account_type,
            new_account.initial_balance,
            &icon,
            &color,
        ),
    )?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        name: name.to_owned(),
        account_type: new_account.account_type,
        initial_balance: new_account.initial_balance,
        current_balance: new_account.initial_balance,
        icon,
        color,
    })
}

/// Get the account `account_id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::MissingAccount] if there is no such account for the user.
pub fn get_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((account_id, user_id.as_i64()), map_row_to_account)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingAccount(account_id),
            error => error.into(),
        })
}

/// List the accounts of `user_id` ordered by type and then name.
pub fn list_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = ?1 ORDER BY type, name"
        ))?
        .query_map((user_id.as_i64(),), map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Change the name, type, icon or color of an account and return the updated account.
///
/// # Errors
/// Returns [Error::Validation] for an empty name or [Error::MissingAccount]
/// if there is no such account for the user.
pub fn update_account(
    user_id: UserID,
    account_id: AccountId,
    edit: AccountEdit,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = edit.name.as_deref().map(validate_name).transpose()?;

    let rows_affected = connection.execute(
        "UPDATE account SET
            name = COALESCE(?1, name),
            type = COALESCE(?2, type),
            icon = COALESCE(?3, icon),
            color = COALESCE(?4, color)
         WHERE id = ?5 AND user_id = ?6",
        (
            name,
            edit.account_type,
            edit.icon.as_deref(),
            edit.color.as_deref(),
            account_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingAccount(account_id));
    }

    get_account(user_id, account_id, connection)
}

/// Delete an account that no transaction refers to.
///
/// # Errors
/// Returns:
/// - [Error::MissingAccount] if there is no such account for the user,
/// - [Error::AccountInUse] if a transaction uses the account as its source or destination.
pub fn delete_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &mut Connection,
) -> Result<(), Error> {
    run_in_unit_of_work(connection, |transaction| {
        get_account(user_id, account_id, transaction)?;

        if account_has_transactions(user_id, account_id, transaction)? {
            return Err(Error::AccountInUse(account_id));
        }

        transaction.execute(
            "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
            (account_id, user_id.as_i64()),
        )?;

        Ok(())
    })
}

/// Add `delta` to the current balance of an account.
///
/// Only the ledger calls this, inside its unit of work.
///
/// # Errors
/// Returns:
/// - [Error::MissingAccount] if there is no such account for the user,
/// - [Error::InvalidAmount] if the new balance is too large to store,
/// - [Error::SqlError] if an SQL related error occurred.
pub(crate) fn adjust_balance(
    user_id: UserID,
    account_id: AccountId,
    delta: Money,
    connection: &Connection,
) -> Result<(), Error> {
    let current_balance: Money = connection
        .query_row(
            "SELECT current_balance FROM account WHERE id = ?1 AND user_id = ?2",
            (account_id, user_id.as_i64()),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingAccount(account_id),
            error => error.into(),
        })?;

    let new_balance = current_balance.checked_add(delta).ok_or_else(|| {
        Error::InvalidAmount(format!(
            "the balance of account {account_id} would be too large"
        ))
    })?;

    connection.execute(
        "UPDATE account SET current_balance = ?1 WHERE id = ?2 AND user_id = ?3",
        (new_balance, account_id, user_id.as_i64()),
    )?;

    Ok(())
}

/// Total the user's assets and liabilities.
pub fn get_account_summary(
    user_id: UserID,
    connection: &Connection,
) -> Result<AccountSummary, Error> {
    let (total_assets, total_liabilities): (Money, Money) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN type IN ('cash', 'bank', 'ewallet') THEN current_balance END), 0),
            COALESCE(SUM(CASE WHEN type = 'debt' AND current_balance > 0 THEN current_balance END), 0)
         FROM account WHERE user_id = ?1",
        (user_id.as_i64(),),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(AccountSummary {
        total_assets,
        total_liabilities,
        net_worth: total_assets - total_liabilities,
    })
}

/// Count the accounts of `user_id`.
pub fn count_accounts(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM account WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}
