//! Defines the endpoint for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    api_response::created,
    auth::AuthContext,
    timezone::get_local_today,
    transaction::{TransactionDraft, create_transaction, get_transaction_details},
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
///
/// Transactions without a date are dated today in the server's timezone.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(auth): Extension<AuthContext>,
    Json(draft): Json<TransactionDraft>,
) -> Response {
    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let transaction_id = match create_transaction(&auth, draft, today, &mut connection) {
        Ok(transaction_id) => transaction_id,
        Err(error) => {
            tracing::debug!("Could not create transaction: {error}");
            return error.into_response();
        }
    };

    match get_transaction_details(auth.user_id, transaction_id, &connection) {
        Ok(transaction) => created("Transaction created", transaction),
        Err(error) => error.into_response(),
    }
}
