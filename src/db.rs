//! Database setup and the unit of work used by multi-step mutations.

use rusqlite::{Connection, TransactionBehavior};

use crate::{
    Error, account::create_account_table, budget::create_budget_table,
    category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the all of the database tables for the application.
///
/// Foreign key enforcement is switched on for `connection` first, since
/// SQLite leaves it off by default and the pragma has no effect inside a
/// transaction.
///
/// # Errors
/// This function may return a [Error::SqlError] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Run `work` as a single all-or-nothing unit against the database.
///
/// The unit of work is opened with `BEGIN IMMEDIATE`, so the write lock is
/// held from the first read, which makes read-modify-write sequences such as
/// balance adjustments serializable. The unit is committed if `work` returns
/// `Ok` and rolled back if it returns `Err`, before this function returns.
///
/// # Errors
/// Returns the error from `work`, or a [Error::SqlError] if the unit of
/// work could not be started or committed.
pub fn run_in_unit_of_work<T, F>(connection: &mut Connection, work: F) -> Result<T, Error>
where
    F: FnOnce(&rusqlite::Transaction) -> Result<T, Error>,
{
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    match work(&transaction) {
        Ok(value) => {
            transaction.commit()?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = transaction.rollback() {
                tracing::error!("Could not roll back unit of work: {rollback_error}");
            }

            Err(error)
        }
    }
}
