//! Endpoints for the logged-in user's own profile.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    api_response::{success, success_without_data},
    auth::{AuthContext, invalidate_auth_cookie},
    seed::seed_default_data,
    user::{
        PasswordHash, ProfileUpdate, ValidatedPassword, clear_user_data, delete_user,
        get_user_by_id, update_password, update_profile,
    },
};

/// The state needed by the profile endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<ProfileState> for Key {
    fn from_ref(state: &ProfileState) -> Self {
        state.cookie_key.clone()
    }
}

/// A route handler that returns the logged-in user without their password hash.
pub async fn get_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_user_by_id(auth.user_id, &connection) {
        Ok(user) => success("Profile retrieved", user),
        Err(error) => error.into_response(),
    }
}

/// A route handler for updating the logged-in user's profile and preferences.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(auth): Extension<AuthContext>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_profile(auth.user_id, update, &connection) {
        Ok(user) => success("Profile updated", user),
        Err(error) => error.into_response(),
    }
}

/// A route handler that deletes the logged-in user with all of their data
/// and ends their session.
pub async fn delete_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(auth): Extension<AuthContext>,
    jar: PrivateCookieJar,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_user(auth.user_id, &mut connection) {
        Ok(()) => {
            tracing::info!("Deleted user {}", auth.user_id);
            (
                invalidate_auth_cookie(jar),
                success_without_data("Account deleted"),
            )
                .into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// A route handler that deletes every account, category, transaction and
/// budget of the logged-in user while keeping the user and their session.
pub async fn clear_data_endpoint(
    State(state): State<ProfileState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match clear_user_data(auth.user_id, &mut connection) {
        Ok(()) => {
            tracing::info!("Cleared the data of user {}", auth.user_id);
            success_without_data("All data cleared")
        }
        Err(error) => error.into_response(),
    }
}

/// The body of a password change request.
#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    /// The password the user logs in with now.
    pub current_password: String,
    /// The password to replace it with.
    pub new_password: String,
}

/// A route handler for changing the logged-in user's password.
///
/// The current password must be given and the new one must pass the strength check.
pub async fn change_password_endpoint(
    State(state): State<ProfileState>,
    Extension(auth): Extension<AuthContext>,
    Json(change): Json<PasswordChange>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let user = match get_user_by_id(auth.user_id, &connection) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    match user.password_hash.verify(&change.current_password) {
        Ok(true) => {}
        Ok(false) => {
            return Error::Validation("the current password is incorrect".to_owned())
                .into_response();
        }
        Err(error) => return error.into_response(),
    }

    let password_hash = match ValidatedPassword::new(
        &change.new_password,
        &[&user.name, user.email.as_str()],
    )
    .and_then(|password| PasswordHash::new(password, PasswordHash::DEFAULT_COST))
    {
        Ok(password_hash) => password_hash,
        Err(error) => return error.into_response(),
    };

    match update_password(auth.user_id, &password_hash, &connection) {
        Ok(()) => success_without_data("Password changed"),
        Err(error) => error.into_response(),
    }
}

/// A route handler that adds the default categories and accounts for the
/// logged-in user where they have none.
pub async fn seed_defaults_endpoint(
    State(state): State<ProfileState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match seed_default_data(auth.user_id, &connection) {
        Ok(outcome) => success("Default data initialized", outcome),
        Err(error) => error.into_response(),
    }
}
