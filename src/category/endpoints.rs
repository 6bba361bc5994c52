//! The category API endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    api_response::{created, success, success_without_data},
    auth::AuthContext,
    category::{
        CategoryEdit, CategoryId, CategoryType, NewCategory, create_category, delete_category,
        get_category, list_categories, update_category,
    },
};

/// The state needed to manage categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Only list categories of this type.
    #[serde(rename = "type")]
    pub category_type: Option<CategoryType>,
}

/// A route handler that lists the user's categories, optionally of one type.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CategoryQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match list_categories(auth.user_id, query.category_type, &connection) {
        Ok(categories) => success("Categories retrieved", categories),
        Err(error) => error.into_response(),
    }
}

/// A route handler that returns a single category.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(auth): Extension<AuthContext>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_category(auth.user_id, category_id, &connection) {
        Ok(category) => success("Category retrieved", category),
        Err(error) => error.into_response(),
    }
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(auth): Extension<AuthContext>,
    Json(new_category): Json<NewCategory>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_category(auth.user_id, new_category, &connection) {
        Ok(category) => created("Category created", category),
        Err(error) => error.into_response(),
    }
}

/// A route handler for editing a category.
pub async fn edit_category_endpoint(
    State(state): State<CategoryState>,
    Extension(auth): Extension<AuthContext>,
    Path(category_id): Path<CategoryId>,
    Json(edit): Json<CategoryEdit>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_category(auth.user_id, category_id, edit, &mut connection) {
        Ok(category) => success("Category updated", category),
        Err(error) => {
            tracing::debug!("Could not update category {category_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler for deleting a category that no transaction uses.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(auth): Extension<AuthContext>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_category(auth.user_id, category_id, &mut connection) {
        Ok(()) => success_without_data("Category deleted"),
        Err(error) => {
            tracing::debug!("Could not delete category {category_id}: {error}");
            error.into_response()
        }
    }
}
