//! Defines the endpoint for replacing the contents of a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    api_response::success,
    auth::AuthContext,
    transaction::{TransactionDraft, TransactionId, update_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a transaction and the balances it affects.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<TransactionId>,
    Json(draft): Json<TransactionDraft>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_transaction(&auth, transaction_id, draft, &mut connection) {
        Ok(transaction) => success("Transaction updated", transaction),
        Err(error) => {
            tracing::debug!("Could not update transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Money,
        account::{AccountType, NewAccount, create_account, get_account},
        auth::AuthContext,
        category::{CategoryType, NewCategory, create_category},
        test_utils::{get_test_connection, insert_test_user, parse_json_body},
        transaction::{TransactionDraft, create_transaction},
    };

    use super::{EditTransactionState, edit_transaction_endpoint};

    #[tokio::test]
    async fn update_moves_balance() {
        let mut connection = get_test_connection();
        let user_id = insert_test_user(&connection, "budi@example.com");
        let auth = AuthContext { user_id };
        let account = create_account(
            user_id,
            NewAccount::new("Bank", AccountType::Bank, Money::new(dec!(1000)).unwrap()),
            &connection,
        )
        .unwrap();
        let category = create_category(
            user_id,
            NewCategory::new("Food", CategoryType::Expense),
            &connection,
        )
        .unwrap();
        let transaction_id = create_transaction(
            &auth,
            TransactionDraft::expense(account.id, category.id, Money::new(dec!(200)).unwrap()),
            date!(2024 - 03 - 01),
            &mut connection,
        )
        .unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = edit_transaction_endpoint(
            State(state.clone()),
            Extension(auth),
            Path(transaction_id),
            Json(TransactionDraft::expense(
                account.id,
                category.id,
                Money::new(dec!(500)).unwrap(),
            )),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body["data"]["amount"], "500.00");
        assert_eq!(body["data"]["transaction_date"], "2024-03-01");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_account(user_id, account.id, &connection)
                .unwrap()
                .current_balance,
            Money::new(dec!(500)).unwrap()
        );
    }

    #[tokio::test]
    async fn update_missing_transaction_is_not_found() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "budi@example.com");
        let account = create_account(
            user_id,
            NewAccount::new("Bank", AccountType::Bank, Money::ZERO),
            &connection,
        )
        .unwrap();
        let category = create_category(
            user_id,
            NewCategory::new("Food", CategoryType::Expense),
            &connection,
        )
        .unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = edit_transaction_endpoint(
            State(state),
            Extension(AuthContext { user_id }),
            Path(7),
            Json(TransactionDraft::expense(
                account.id,
                category.id,
                Money::new(dec!(5)).unwrap(),
            )),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
