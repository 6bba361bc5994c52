//! Defines the endpoint for updating an account
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{AccountEdit, AccountId, update_account},
    api_response::success,
    auth::AuthContext,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for renaming or restyling an account. Balances cannot be edited.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<AccountId>,
    Json(edit): Json<AccountEdit>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_account(auth.user_id, account_id, edit, &connection) {
        Ok(account) => success("Account updated", account),
        Err(error) => {
            tracing::debug!("Could not update account {account_id}: {error}");
            error.into_response()
        }
    }
}
