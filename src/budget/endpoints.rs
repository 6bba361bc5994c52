//! The budget API endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    api_response::{created, success, success_without_data},
    auth::AuthContext,
    budget::{
        BudgetEdit, BudgetId, BudgetProgress, BudgetSummary, NewBudget, create_budget,
        delete_budget, get_budget, get_budget_progress, list_budgets, summarize_budgets,
        update_budget,
    },
    timezone::get_local_today,
};

/// The state needed to manage budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BudgetProgressReport {
    progress: Vec<BudgetProgress>,
    summary: BudgetSummary,
}

/// A route handler that lists the user's budgets.
pub async fn list_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match list_budgets(auth.user_id, &connection) {
        Ok(budgets) => success("Budgets retrieved", budgets),
        Err(error) => error.into_response(),
    }
}

/// A route handler that returns a single budget.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(auth): Extension<AuthContext>,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_budget(auth.user_id, budget_id, &connection) {
        Ok(budget) => success("Budget retrieved", budget),
        Err(error) => error.into_response(),
    }
}

/// A route handler that returns the progress of each budget and the totals across them.
pub async fn get_budget_progress_endpoint(
    State(state): State<BudgetState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_budget_progress(auth.user_id, &connection) {
        Ok(progress) => {
            let summary = summarize_budgets(&progress);
            success(
                "Budget progress retrieved",
                BudgetProgressReport { progress, summary },
            )
        }
        Err(error) => error.into_response(),
    }
}

/// A route handler for creating a budget. Budgets without a start date start today.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(auth): Extension<AuthContext>,
    Json(new_budget): Json<NewBudget>,
) -> Response {
    let today = match get_local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_budget(auth.user_id, new_budget, today, &connection) {
        Ok(budget) => created("Budget created", budget),
        Err(error) => {
            tracing::debug!("Could not create budget: {error}");
            error.into_response()
        }
    }
}

/// A route handler for editing a budget.
pub async fn edit_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(auth): Extension<AuthContext>,
    Path(budget_id): Path<BudgetId>,
    Json(edit): Json<BudgetEdit>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_budget(auth.user_id, budget_id, edit, &connection) {
        Ok(budget) => success("Budget updated", budget),
        Err(error) => error.into_response(),
    }
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(auth): Extension<AuthContext>,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_budget(auth.user_id, budget_id, &connection) {
        Ok(()) => success_without_data("Budget deleted"),
        Err(error) => error.into_response(),
    }
}
