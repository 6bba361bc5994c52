//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::Response,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_account_endpoint, get_account_summary_endpoint, list_accounts_endpoint,
    },
    api_response,
    auth::{auth_guard, post_log_in, post_log_out, register_user},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, edit_budget_endpoint,
        get_budget_endpoint, get_budget_progress_endpoint, list_budgets_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, edit_category_endpoint,
        get_category_endpoint, list_categories_endpoint,
    },
    dashboard::{
        get_account_statistics_endpoint, get_calendar_endpoint, get_category_statistics_endpoint,
        get_dashboard_endpoint, get_overview_endpoint, get_trend_endpoint,
    },
    endpoints,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, list_transactions_endpoint,
    },
    user::{
        change_password_endpoint, clear_data_endpoint, delete_profile_endpoint,
        get_profile_endpoint, seed_defaults_endpoint, update_profile_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(
            endpoints::CURRENT_USER,
            get(get_profile_endpoint)
                .put(update_profile_endpoint)
                .delete(delete_profile_endpoint),
        )
        .route(endpoints::CURRENT_USER_PASSWORD, put(change_password_endpoint))
        .route(endpoints::CURRENT_USER_DEFAULTS, post(seed_defaults_endpoint))
        .route(endpoints::CURRENT_USER_DATA, delete(clear_data_endpoint))
        .route(
            endpoints::ACCOUNTS,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(endpoints::ACCOUNT_SUMMARY, get(get_account_summary_endpoint))
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .put(edit_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(edit_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(endpoints::BUDGET_PROGRESS, get(get_budget_progress_endpoint))
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(edit_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard_endpoint))
        .route(endpoints::STATISTICS_OVERVIEW, get(get_overview_endpoint))
        .route(
            endpoints::STATISTICS_CATEGORIES,
            get(get_category_statistics_endpoint),
        )
        .route(
            endpoints::STATISTICS_ACCOUNTS,
            get(get_account_statistics_endpoint),
        )
        .route(endpoints::STATISTICS_TREND, get(get_trend_endpoint))
        .route(endpoints::STATISTICS_CALENDAR, get(get_calendar_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    api_response::error(StatusCode::NOT_FOUND, "Endpoint not found")
}
