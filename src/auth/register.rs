//! Handles registering new users.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    api_response::created,
    auth::set_auth_cookie,
    seed::seed_default_data,
    user::{Email, NewUser, PasswordHash, ValidatedPassword, create_user},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data sent to register a user.
#[derive(Clone, Deserialize)]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A route handler for registering a new user.
///
/// The new user gets the default categories and accounts and is logged in
/// straight away. Failing to seed the defaults is logged but does not fail
/// the registration.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Json(data): Json<RegisterData>,
) -> Response {
    let email = match Email::new(&data.email) {
        Ok(email) => email,
        Err(error) => return error.into_response(),
    };

    let password_hash = match ValidatedPassword::new(&data.password, &[&data.name, email.as_str()])
        .and_then(|password| PasswordHash::new(password, PasswordHash::DEFAULT_COST))
    {
        Ok(password_hash) => password_hash,
        Err(error) => return error.into_response(),
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        let user = match create_user(
            NewUser {
                name: data.name,
                email,
                password_hash,
            },
            &connection,
        ) {
            Ok(user) => user,
            Err(error) => return error.into_response(),
        };

        match seed_default_data(user.id, &connection) {
            Ok(outcome) => tracing::debug!("Seeded default data for user {}: {outcome:?}", user.id),
            Err(error) => {
                tracing::warn!("Could not seed default data for user {}: {error}", user.id)
            }
        }

        user
    };

    tracing::info!("Registered user {}", user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (jar, created("Registration successful", user)).into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            error.into_response()
        }
    }
}
