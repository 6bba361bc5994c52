//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, Money, account::AccountId, category::CategoryId, user::UserID};

pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money came in, went out, or moved between two accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            _ => Err(Error::Validation(
                "type must be one of income, expense or transfer".to_owned(),
            )),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.into()))
    }
}

/// The type of a transaction together with the one reference that type needs.
///
/// Income and expenses are filed under a category, transfers name the
/// account that receives the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionKind {
    Income { category_id: CategoryId },
    Expense { category_id: CategoryId },
    Transfer { to_account_id: AccountId },
}

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Income { .. } => TransactionType::Income,
            TransactionKind::Expense { .. } => TransactionType::Expense,
            TransactionKind::Transfer { .. } => TransactionType::Transfer,
        }
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        match self {
            TransactionKind::Income { category_id } | TransactionKind::Expense { category_id } => {
                Some(*category_id)
            }
            TransactionKind::Transfer { .. } => None,
        }
    }

    pub fn to_account_id(&self) -> Option<AccountId> {
        match self {
            TransactionKind::Transfer { to_account_id } => Some(*to_account_id),
            _ => None,
        }
    }
}

/// A stored income, expense or transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(flatten)]
    pub kind: TransactionKind,
    /// The account money is added to for income, or taken from for expenses and transfers.
    pub account_id: AccountId,
    pub amount: Money,
    pub transaction_date: Date,
    pub description: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A transaction with the names of the accounts and category it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account_name: String,
    pub to_account_name: Option<String>,
    pub category_name: Option<String>,
}

/// The unvalidated data for creating or replacing a transaction.
///
/// Every field is optional so that missing fields are reported in a fixed
/// order by [TransactionDraft::validate] rather than by the JSON parser.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub account_id: Option<AccountId>,
    pub to_account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub amount: Option<Money>,
    pub transaction_date: Option<Date>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl TransactionDraft {
    /// A draft for money earned into `account_id`.
    pub fn income(account_id: AccountId, category_id: CategoryId, amount: Money) -> Self {
        Self {
            transaction_type: Some(TransactionType::Income.to_string()),
            account_id: Some(account_id),
            category_id: Some(category_id),
            amount: Some(amount),
            ..Default::default()
        }
    }

    /// A draft for money spent from `account_id`.
    pub fn expense(account_id: AccountId, category_id: CategoryId, amount: Money) -> Self {
        Self {
            transaction_type: Some(TransactionType::Expense.to_string()),
            account_id: Some(account_id),
            category_id: Some(category_id),
            amount: Some(amount),
            ..Default::default()
        }
    }

    /// A draft for money moved from `from_account_id` to `to_account_id`.
    pub fn transfer(from_account_id: AccountId, to_account_id: AccountId, amount: Money) -> Self {
        Self {
            transaction_type: Some(TransactionType::Transfer.to_string()),
            account_id: Some(from_account_id),
            to_account_id: Some(to_account_id),
            amount: Some(amount),
            ..Default::default()
        }
    }

    /// Set the date of the transaction.
    pub fn on(mut self, transaction_date: Date) -> Self {
        self.transaction_date = Some(transaction_date);
        self
    }

    /// Set the description of the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Check the draft field by field and turn it into a [ValidatedTransaction].
    ///
    /// The checks run in this order and the first one that fails is reported:
    /// the type, the account, a positive amount, the destination account of a
    /// transfer, the category of income or expenses, the precision of the
    /// amount and finally that a transfer does not go to its source account.
    ///
    /// A category on a transfer or a destination account on income or
    /// expenses is ignored.
    ///
    /// # Errors
    /// Returns [Error::Validation] or [Error::InvalidAmount] naming the first
    /// rule the draft breaks.
    pub fn validate(self) -> Result<ValidatedTransaction, Error> {
        let transaction_type: TransactionType = self
            .transaction_type
            .as_deref()
            .ok_or_else(|| {
                Error::Validation("type must be one of income, expense or transfer".to_owned())
            })?
            .parse()?;

        let account_id = self
            .account_id
            .ok_or_else(|| Error::Validation("account_id is required".to_owned()))?;

        let amount = match self.amount {
            Some(amount) if amount.is_positive() => amount,
            _ => {
                return Err(Error::Validation(
                    "amount must be greater than zero".to_owned(),
                ));
            }
        };

        let kind = match transaction_type {
            TransactionType::Transfer => TransactionKind::Transfer {
                to_account_id: self.to_account_id.ok_or_else(|| {
                    Error::Validation("to_account_id is required for transfers".to_owned())
                })?,
            },
            TransactionType::Income | TransactionType::Expense => {
                let category_id = self.category_id.ok_or_else(|| {
                    Error::Validation(
                        "category_id is required for income and expenses".to_owned(),
                    )
                })?;

                if transaction_type == TransactionType::Income {
                    TransactionKind::Income { category_id }
                } else {
                    TransactionKind::Expense { category_id }
                }
            }
        };

        amount.check_precision()?;

        if kind.to_account_id() == Some(account_id) {
            return Err(Error::Validation(
                "a transfer must go to a different account".to_owned(),
            ));
        }

        Ok(ValidatedTransaction {
            kind,
            account_id,
            amount,
            transaction_date: self.transaction_date,
            description: non_blank(self.description),
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// A transaction that passed [TransactionDraft::validate].
///
/// References to accounts and categories have not been checked against the
/// database yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransaction {
    pub kind: TransactionKind,
    pub account_id: AccountId,
    pub amount: Money,
    /// `None` means the caller decides the date.
    pub transaction_date: Option<Date>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Which transactions to list. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionFilter {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Matches transactions where the account is either the source or the destination.
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    /// The earliest date to include.
    pub date_from: Option<Date>,
    /// The latest date to include.
    pub date_to: Option<Date>,
    /// The maximum number of transactions to return.
    pub limit: Option<u32>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense', 'transfer')),
            account_id INTEGER NOT NULL,
            to_account_id INTEGER,
            category_id INTEGER,
            amount INTEGER NOT NULL CHECK (amount > 0),
            transaction_date TEXT NOT NULL,
            description TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            CHECK (
                (type = 'transfer' AND to_account_id IS NOT NULL AND category_id IS NULL)
                OR (type != 'transfer' AND category_id IS NOT NULL AND to_account_id IS NULL)
            ),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(to_account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
         ON \"transaction\"(user_id, transaction_date)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account ON \"transaction\"(account_id)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_to_account ON \"transaction\"(to_account_id)",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id)",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "t.id, t.type, t.category_id, t.to_account_id, t.account_id, \
    t.amount, t.transaction_date, t.description, t.notes, t.created_at";

/// Map a row starting with [TRANSACTION_COLUMNS] to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let transaction_type = row.get(1)?;
    let category_id: Option<CategoryId> = row.get(2)?;
    let to_account_id: Option<AccountId> = row.get(3)?;

    let kind = match (transaction_type, category_id, to_account_id) {
        (TransactionType::Income, Some(category_id), _) => TransactionKind::Income { category_id },
        (TransactionType::Expense, Some(category_id), _) => {
            TransactionKind::Expense { category_id }
        }
        (TransactionType::Transfer, _, Some(to_account_id)) => {
            TransactionKind::Transfer { to_account_id }
        }
        (transaction_type, _, _) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("{transaction_type} transaction {id} is missing its reference").into(),
            ));
        }
    };

    Ok(Transaction {
        id,
        kind,
        account_id: row.get(4)?,
        amount: row.get(5)?,
        transaction_date: row.get(6)?,
        description: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_details_row(row: &Row) -> Result<TransactionDetails, rusqlite::Error> {
    Ok(TransactionDetails {
        transaction: map_transaction_row(row)?,
        account_name: row.get(10)?,
        to_account_name: row.get(11)?,
        category_name: row.get(12)?,
    })
}

/// Insert a validated transaction dated `transaction_date` without touching any balance.
///
/// Balances must be adjusted in the same unit of work, see
/// [crate::transaction::create_transaction].
pub(super) fn insert_transaction(
    user_id: UserID,
    transaction: &ValidatedTransaction,
    transaction_date: Date,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    connection.execute(
        "INSERT INTO \"transaction\" (user_id, type, account_id, to_account_id, category_id,
            amount, transaction_date, description, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            user_id.as_i64(),
            transaction.kind.transaction_type(),
            transaction.account_id,
            transaction.kind.to_account_id(),
            transaction.kind.category_id(),
            transaction.amount,
            transaction_date,
            transaction.description.as_deref(),
            transaction.notes.as_deref(),
            created_at,
        ),
    )?;

    Ok(connection.last_insert_rowid())
}

/// Overwrite every user editable field of a stored transaction.
pub(super) fn overwrite_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    transaction: &ValidatedTransaction,
    transaction_date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET
            type = ?1,
            account_id = ?2,
            to_account_id = ?3,
            category_id = ?4,
            amount = ?5,
            transaction_date = ?6,
            description = ?7,
            notes = ?8
         WHERE id = ?9 AND user_id = ?10",
        (
            transaction.kind.transaction_type(),
            transaction.account_id,
            transaction.kind.to_account_id(),
            transaction.kind.category_id(),
            transaction.amount,
            transaction_date,
            transaction.description.as_deref(),
            transaction.notes.as_deref(),
            transaction_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingTransaction(transaction_id));
    }

    Ok(())
}

pub(super) fn remove_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (transaction_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::MissingTransaction(transaction_id));
    }

    Ok(())
}

/// Get the transaction `transaction_id` if it belongs to `user_id`.
///
/// # Errors
/// Returns [Error::MissingTransaction] if there is no such transaction for the user.
pub fn get_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" t WHERE t.id = ?1 AND t.user_id = ?2"
        ))?
        .query_row((transaction_id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingTransaction(transaction_id),
            error => error.into(),
        })
}

const DETAILS_QUERY: &str = "FROM \"transaction\" t
    INNER JOIN account a ON a.id = t.account_id
    LEFT JOIN account ta ON ta.id = t.to_account_id
    LEFT JOIN category c ON c.id = t.category_id";

/// Get the transaction `transaction_id` with the names of its accounts and category.
///
/// # Errors
/// Returns [Error::MissingTransaction] if there is no such transaction for the user.
pub fn get_transaction_details(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<TransactionDetails, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, a.name, ta.name, c.name {DETAILS_QUERY}
             WHERE t.id = ?1 AND t.user_id = ?2"
        ))?
        .query_row((transaction_id, user_id.as_i64()), map_details_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingTransaction(transaction_id),
            error => error.into(),
        })
}

/// List the transactions of `user_id` that match `filter`, newest first.
///
/// Transactions on the same date are ordered by when they were recorded.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionDetails>, Error> {
    // A negative limit means no limit in SQLite.
    let limit = filter.limit.map(i64::from).unwrap_or(-1);

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, a.name, ta.name, c.name {DETAILS_QUERY}
             WHERE t.user_id = ?1
                AND (?2 IS NULL OR t.type = ?2)
                AND (?3 IS NULL OR t.account_id = ?3 OR t.to_account_id = ?3)
                AND (?4 IS NULL OR t.category_id = ?4)
                AND (?5 IS NULL OR t.transaction_date >= ?5)
                AND (?6 IS NULL OR t.transaction_date <= ?6)
             ORDER BY t.transaction_date DESC, t.created_at DESC, t.id DESC
             LIMIT ?7"
        ))?
        .query_map(
            (
                user_id.as_i64(),
                filter.transaction_type,
                filter.account_id,
                filter.category_id,
                filter.date_from,
                filter.date_to,
                limit,
            ),
            map_details_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Whether any transaction of `user_id` moves money out of or into `account_id`.
pub fn account_has_transactions(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (
                SELECT 1 FROM \"transaction\"
                WHERE user_id = ?1 AND (account_id = ?2 OR to_account_id = ?2)
            )",
            (user_id.as_i64(), account_id),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Whether any transaction of `user_id` is filed under `category_id`.
pub fn category_has_transactions(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (
                SELECT 1 FROM \"transaction\" WHERE user_id = ?1 AND category_id = ?2
            )",
            (user_id.as_i64(), category_id),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Get the number of transactions of `user_id`.
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod transaction_draft_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{Error, Money};

    use super::{TransactionDraft, TransactionKind};

    fn amount(value: rust_decimal::Decimal) -> Money {
        Money::new(value).unwrap()
    }

    fn validation_message(draft: TransactionDraft) -> String {
        match draft.validate() {
            Err(Error::Validation(message)) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_expense() {
        let draft = TransactionDraft::expense(1, 2, amount(dec!(200)))
            .on(date!(2024 - 03 - 01))
            .description("  Lunch ");

        let transaction = draft.validate().unwrap();

        assert_eq!(transaction.kind, TransactionKind::Expense { category_id: 2 });
        assert_eq!(transaction.account_id, 1);
        assert_eq!(transaction.amount, amount(dec!(200)));
        assert_eq!(transaction.transaction_date, Some(date!(2024 - 03 - 01)));
        assert_eq!(transaction.description.as_deref(), Some("Lunch"));
        assert_eq!(transaction.notes, None);
    }

    #[test]
    fn missing_type_is_reported_first() {
        let message = validation_message(TransactionDraft::default());

        assert_eq!(message, "type must be one of income, expense or transfer");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let draft = TransactionDraft {
            transaction_type: Some("refund".to_owned()),
            ..TransactionDraft::expense(1, 2, amount(dec!(1)))
        };

        assert_eq!(
            validation_message(draft),
            "type must be one of income, expense or transfer"
        );
    }

    #[test]
    fn missing_account_is_reported_before_amount() {
        let draft = TransactionDraft {
            transaction_type: Some("expense".to_owned()),
            ..Default::default()
        };

        assert_eq!(validation_message(draft), "account_id is required");
    }

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        for value in [dec!(0), dec!(-5)] {
            let draft = TransactionDraft::expense(1, 2, amount(value));

            assert_eq!(validation_message(draft), "amount must be greater than zero");
        }
    }

    #[test]
    fn missing_amount_is_rejected() {
        let draft = TransactionDraft {
            amount: None,
            ..TransactionDraft::income(1, 2, amount(dec!(1)))
        };

        assert_eq!(validation_message(draft), "amount must be greater than zero");
    }

    #[test]
    fn transfer_requires_destination() {
        let draft = TransactionDraft {
            to_account_id: None,
            ..TransactionDraft::transfer(1, 2, amount(dec!(1)))
        };

        assert_eq!(
            validation_message(draft),
            "to_account_id is required for transfers"
        );
    }

    #[test]
    fn income_requires_category() {
        let draft = TransactionDraft {
            category_id: None,
            ..TransactionDraft::income(1, 2, amount(dec!(1)))
        };

        assert_eq!(
            validation_message(draft),
            "category_id is required for income and expenses"
        );
    }

    #[test]
    fn sub_cent_amount_is_rejected() {
        let draft = TransactionDraft {
            amount: Some(serde_json::from_str("1.005").unwrap()),
            ..TransactionDraft::expense(1, 2, amount(dec!(1)))
        };

        assert!(matches!(draft.validate(), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn transfer_to_same_account_is_rejected() {
        let draft = TransactionDraft::transfer(1, 1, amount(dec!(10)));

        assert_eq!(
            validation_message(draft),
            "a transfer must go to a different account"
        );
    }

    #[test]
    fn irrelevant_references_are_discarded() {
        let expense = TransactionDraft {
            to_account_id: Some(9),
            ..TransactionDraft::expense(1, 2, amount(dec!(1)))
        };
        let transfer = TransactionDraft {
            category_id: Some(9),
            ..TransactionDraft::transfer(1, 2, amount(dec!(1)))
        };

        assert_eq!(
            expense.validate().unwrap().kind,
            TransactionKind::Expense { category_id: 2 }
        );
        assert_eq!(
            transfer.validate().unwrap().kind,
            TransactionKind::Transfer { to_account_id: 2 }
        );
    }

    #[test]
    fn deserializes_from_json() {
        let draft: TransactionDraft = serde_json::from_str(
            r#"{
                "type": "transfer",
                "account_id": 1,
                "to_account_id": 2,
                "amount": "300",
                "transaction_date": "2024-03-02"
            }"#,
        )
        .unwrap();

        assert_eq!(
            draft,
            TransactionDraft::transfer(1, 2, amount(dec!(300))).on(date!(2024 - 03 - 02))
        );
    }
}
