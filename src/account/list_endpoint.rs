//! Read-only account endpoints: list, fetch one, and the net worth summary.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{AccountId, get_account, get_account_summary, list_accounts},
    api_response::success,
    auth::AuthContext,
};

/// The state needed to read accounts.
#[derive(Debug, Clone)]
pub struct AccountsState {
    /// The database connection for reading accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the user's accounts.
pub async fn list_accounts_endpoint(
    State(state): State<AccountsState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match list_accounts(auth.user_id, &connection) {
        Ok(accounts) => success("Accounts retrieved", accounts),
        Err(error) => error.into_response(),
    }
}

/// A route handler that returns a single account.
pub async fn get_account_endpoint(
    State(state): State<AccountsState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_account(auth.user_id, account_id, &connection) {
        Ok(account) => success("Account retrieved", account),
        Err(error) => error.into_response(),
    }
}

/// A route handler that returns total assets, total liabilities and net worth.
pub async fn get_account_summary_endpoint(
    State(state): State<AccountsState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_account_summary(auth.user_id, &connection) {
        Ok(summary) => success("Account summary retrieved", summary),
        Err(error) => error.into_response(),
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
    use serde_json::json;

    use crate::{
        Money,
        account::{AccountType, NewAccount, create_account},
        auth::AuthContext,
        test_utils::{get_test_connection, insert_test_user, parse_json_body},
    };

    use super::{
        AccountsState, get_account_endpoint, get_account_summary_endpoint, list_accounts_endpoint,
    };

    fn get_state() -> (AccountsState, AuthContext, i64) {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "budi@example.com");
        let account = create_account(
            user_id,
            NewAccount::new("BCA", AccountType::Bank, Money::from_minor_units(12345)),
            &connection,
        )
        .unwrap();
        create_account(
            user_id,
            NewAccount::new("Card", AccountType::Debt, Money::from_minor_units(2345)),
            &connection,
        )
        .unwrap();

        let state = AccountsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, AuthContext { user_id }, account.id)
    }

    #[tokio::test]
    async fn list_returns_all_accounts() {
        let (state, auth, _) = get_state();

        let response = list_accounts_endpoint(State(state), Extension(auth)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_returns_account() {
        let (state, auth, account_id) = get_state();

        let response = get_account_endpoint(State(state), Extension(auth), Path(account_id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body["data"]["name"], "BCA");
    }

    #[tokio::test]
    async fn get_missing_account_is_not_found() {
        let (state, auth, account_id) = get_state();

        let response =
            get_account_endpoint(State(state), Extension(auth), Path(account_id + 100)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = parse_json_body(response).await;
        assert_eq!(body["data"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn summary_returns_net_worth() {
        let (state, auth, _) = get_state();

        let response = get_account_summary_endpoint(State(state), Extension(auth)).await;

        let body = parse_json_body(response).await;
        assert_eq!(
            body["data"],
            json!({
                "total_assets": "123.45",
                "total_liabilities": "23.45",
                "net_worth": "100.00",
            })
        );
    }
}
