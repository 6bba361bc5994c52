//! Dompet is a web API for tracking personal finances.
//!
//! Users record income, expenses and transfers against their accounts and
//! categories, set budgets, and read dashboard statistics. Every mutation of a
//! transaction keeps the balances of the accounts it touches consistent,
//! see [create_transaction], [update_transaction] and [delete_transaction].
//!
//! This library provides a JSON REST API where every response has the shape
//! `{"error": bool, "message": string, "data": object | null}`.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod account;
mod api_response;
mod app_state;
mod auth;
mod budget;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod logging;
mod money;
mod routing;
mod seed;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountId, AccountType, NewAccount, list_accounts};
pub use app_state::AppState;
pub use auth::AuthContext;
pub use budget::BudgetId;
pub use category::{Category, CategoryId, CategoryType, list_categories};
pub use db::{initialize as initialize_db, run_in_unit_of_work};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::Money;
pub use routing::build_router;
pub use seed::{SeedOutcome, seed_default_data};
pub use transaction::{
    TransactionDraft, TransactionId, create_transaction, delete_transaction, update_transaction,
};
pub use user::{
    Email, NewUser, PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_email,
    get_user_by_id, update_password,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The broad class an [Error] belongs to.
///
/// The kind decides the HTTP status code and whether the error message may be
/// shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input was malformed or incomplete.
    Validation,
    /// A referenced row does not exist for the acting user.
    NotFound,
    /// The operation is blocked by existing rows.
    Conflict,
    /// The client is not logged in or gave the wrong credentials.
    Unauthorized,
    /// The unit of work failed for an infrastructure reason.
    Storage,
}

impl ErrorKind {
    /// The HTTP status code used to report errors of this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email does not belong to a user or the password was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request did not carry a valid, unexpired session cookie.
    #[error("you must be logged in to do that")]
    Unauthenticated,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string is not an email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// Another user already registered with this email address.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The input broke one of the rules for the entity, the message names the rule.
    #[error("{0}")]
    Validation(String),

    /// A money amount could not be used.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A date or month could not be parsed or constructed.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// No transaction with this ID belongs to the user.
    #[error("transaction {0} could not be found")]
    MissingTransaction(i64),

    /// No account with this ID belongs to the user.
    #[error("account {0} could not be found")]
    MissingAccount(i64),

    /// No category with this ID belongs to the user.
    #[error("category {0} could not be found")]
    MissingCategory(i64),

    /// No budget with this ID belongs to the user.
    #[error("budget {0} could not be found")]
    MissingBudget(i64),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The account cannot be deleted while transactions reference it.
    #[error("account {0} cannot be deleted because it has transactions")]
    AccountInUse(i64),

    /// The category cannot be deleted while transactions reference it.
    #[error("category {0} cannot be deleted because it has transactions")]
    CategoryInUse(i64),

    /// The type of a category cannot change while transactions reference it.
    #[error("the type of category {0} cannot change because it has transactions")]
    CategoryTypeLocked(i64),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The session token could not be written to or read from a cookie.
    #[error("could not encode the session token: {0}")]
    TokenError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// Map the error onto the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidCredentials | Error::Unauthenticated => ErrorKind::Unauthorized,
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::Validation(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_) => ErrorKind::Validation,
            Error::MissingTransaction(_)
            | Error::MissingAccount(_)
            | Error::MissingCategory(_)
            | Error::MissingBudget(_)
            | Error::NotFound => ErrorKind::NotFound,
            Error::DuplicateEmail
            | Error::AccountInUse(_)
            | Error::CategoryInUse(_)
            | Error::CategoryTypeLocked(_) => ErrorKind::Conflict,
            Error::HashingError(_)
            | Error::InvalidTimezoneError(_)
            | Error::TokenError(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => ErrorKind::Storage,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.email") => Error::DuplicateEmail,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<time::error::ComponentRange> for Error {
    fn from(value: time::error::ComponentRange) -> Self {
        Error::InvalidDate(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let message = match kind {
            // Storage errors are not intended to be shown to the client.
            ErrorKind::Storage => {
                tracing::error!("An unexpected error occurred: {}", self);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            _ => self.to_string(),
        };

        api_response::error(kind.status_code(), &message)
    }
}
