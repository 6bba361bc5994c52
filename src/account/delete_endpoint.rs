//! Defines the endpoint for deleting an account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{AccountId, delete_account},
    api_response::success_without_data,
    auth::AuthContext,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account.
///
/// Accounts that transactions refer to cannot be deleted.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_account(auth.user_id, account_id, &mut connection) {
        Ok(()) => success_without_data("Account deleted"),
        Err(error) => {
            tracing::debug!("Could not delete account {account_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;

    use crate::{
        Money, TransactionDraft,
        account::{AccountType, NewAccount, create_account, get_account},
        auth::AuthContext,
        category::{CategoryType, NewCategory, create_category},
        create_transaction,
        test_utils::{get_test_connection, insert_test_user},
    };

    use super::{DeleteAccountState, delete_account_endpoint};

    #[tokio::test]
    async fn deleting_account_with_transactions_is_a_conflict() {
        let mut connection = get_test_connection();
        let user_id = insert_test_user(&connection, "budi@example.com");
        let auth = AuthContext { user_id };
        let account = create_account(
            user_id,
            NewAccount::new("Wallet", AccountType::Cash, Money::new(dec!(1000)).unwrap()),
            &connection,
        )
        .unwrap();
        let category = create_category(
            user_id,
            NewCategory::new("Food", CategoryType::Expense),
            &connection,
        )
        .unwrap();
        create_transaction(
            &auth,
            TransactionDraft::expense(account.id, category.id, Money::new(dec!(200)).unwrap()),
            time::macros::date!(2024 - 03 - 01),
            &mut connection,
        )
        .unwrap();
        let state = DeleteAccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_account_endpoint(State(state.clone()), Extension(auth), Path(account.id)).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let connection = state.db_connection.lock().unwrap();
        let account = get_account(user_id, account.id, &connection).unwrap();
        assert_eq!(account.current_balance, Money::new(dec!(800)).unwrap());
    }

    #[tokio::test]
    async fn deleting_unused_account_succeeds() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "budi@example.com");
        let account = create_account(
            user_id,
            NewAccount::new("Wallet", AccountType::Cash, Money::ZERO),
            &connection,
        )
        .unwrap();
        let state = DeleteAccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_account_endpoint(
            State(state),
            Extension(AuthContext { user_id }),
            Path(account.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
