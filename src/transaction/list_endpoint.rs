//! Read-only transaction endpoints: the filtered list and a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    api_response::success,
    auth::AuthContext,
    transaction::{TransactionFilter, TransactionId, get_transaction_details, list_transactions},
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the user's transactions, newest first.
///
/// Accepts the query parameters `type`, `account_id`, `category_id`,
/// `date_from`, `date_to` and `limit`.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionsState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<TransactionFilter>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match list_transactions(auth.user_id, &filter, &connection) {
        Ok(transactions) => success("Transactions retrieved", transactions),
        Err(error) => error.into_response(),
    }
}

/// A route handler that returns a single transaction with its account and category names.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionsState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_transaction_details(auth.user_id, transaction_id, &connection) {
        Ok(transaction) => success("Transaction retrieved", transaction),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, Query, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Money,
        account::{AccountType, NewAccount, create_account},
        auth::AuthContext,
        category::{CategoryType, NewCategory, create_category},
        test_utils::{get_test_connection, insert_test_user, parse_json_body},
        transaction::{TransactionDraft, TransactionFilter, TransactionType, create_transaction},
    };

    use super::{TransactionsState, get_transaction_endpoint, list_transactions_endpoint};

    struct Fixture {
        state: TransactionsState,
        auth: AuthContext,
        wallet: i64,
        savings: i64,
        groceries: i64,
        transfer_id: i64,
    }

    fn get_fixture() -> Fixture {
        let mut connection = get_test_connection();
        let user_id = insert_test_user(&connection, "budi@example.com");
        let auth = AuthContext { user_id };
        let wallet = create_account(
            user_id,
            NewAccount::new("Wallet", AccountType::Cash, Money::new(dec!(500)).unwrap()),
            &connection,
        )
        .unwrap()
        .id;
        let savings = create_account(
            user_id,
            NewAccount::new("Savings", AccountType::Bank, Money::ZERO),
            &connection,
        )
        .unwrap()
        .id;
        let groceries = create_category(
            user_id,
            NewCategory::new("Groceries", CategoryType::Expense),
            &connection,
        )
        .unwrap()
        .id;
        let salary = create_category(
            user_id,
            NewCategory::new("Salary", CategoryType::Income),
            &connection,
        )
        .unwrap()
        .id;

        let today = date!(2024 - 03 - 31);
        let drafts = [
            TransactionDraft::expense(wallet, groceries, Money::new(dec!(20)).unwrap())
                .on(date!(2024 - 02 - 10)),
            TransactionDraft::income(savings, salary, Money::new(dec!(3000)).unwrap())
                .on(date!(2024 - 03 - 01)),
            TransactionDraft::expense(wallet, groceries, Money::new(dec!(35)).unwrap())
                .on(date!(2024 - 03 - 05)),
        ];
        for draft in drafts {
            create_transaction(&auth, draft, today, &mut connection).unwrap();
        }
        let transfer_id = create_transaction(
            &auth,
            TransactionDraft::transfer(savings, wallet, Money::new(dec!(100)).unwrap())
                .on(date!(2024 - 03 - 05)),
            today,
            &mut connection,
        )
        .unwrap();

        Fixture {
            state: TransactionsState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            auth,
            wallet,
            savings,
            groceries,
            transfer_id,
        }
    }

    async fn list(fixture: &Fixture, filter: TransactionFilter) -> Vec<serde_json::Value> {
        let response = list_transactions_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.auth),
            Query(filter),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        parse_json_body(response).await["data"]
            .as_array()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let fixture = get_fixture();

        let transactions = list(&fixture, TransactionFilter::default()).await;

        let dates: Vec<&str> = transactions
            .iter()
            .map(|transaction| transaction["transaction_date"].as_str().unwrap())
            .collect();
        assert_eq!(
            dates,
            ["2024-03-05", "2024-03-05", "2024-03-01", "2024-02-10"]
        );
        // Recorded later on the same day, so listed first.
        assert_eq!(transactions[0]["id"], fixture.transfer_id);
    }

    #[tokio::test]
    async fn filters_by_account_as_source_or_destination() {
        let fixture = get_fixture();

        let transactions = list(
            &fixture,
            TransactionFilter {
                account_id: Some(fixture.wallet),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(transactions.len(), 3);
        assert_eq!(transactions[0]["to_account_name"], "Wallet");
    }

    #[tokio::test]
    async fn filters_by_type_category_and_dates() {
        let fixture = get_fixture();

        let transactions = list(
            &fixture,
            TransactionFilter {
                transaction_type: Some(TransactionType::Expense),
                category_id: Some(fixture.groceries),
                date_from: Some(date!(2024 - 03 - 01)),
                date_to: Some(date!(2024 - 03 - 31)),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["amount"], "35.00");
        assert_eq!(transactions[0]["category_name"], "Groceries");
    }

    #[tokio::test]
    async fn limit_caps_results() {
        let fixture = get_fixture();

        let transactions = list(
            &fixture,
            TransactionFilter {
                limit: Some(2),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(transactions.len(), 2);
    }

    #[tokio::test]
    async fn get_includes_names() {
        let fixture = get_fixture();

        let response = get_transaction_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.auth),
            Path(fixture.transfer_id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body["data"]["type"], "transfer");
        assert_eq!(body["data"]["account_id"], fixture.savings);
        assert_eq!(body["data"]["account_name"], "Savings");
        assert_eq!(body["data"]["to_account_name"], "Wallet");
        assert_eq!(body["data"]["category_name"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn get_missing_transaction_is_not_found() {
        let fixture = get_fixture();

        let response = get_transaction_endpoint(
            State(fixture.state.clone()),
            Extension(fixture.auth),
            Path(fixture.transfer_id + 10),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
