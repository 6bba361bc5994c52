#![allow(missing_docs)]

use axum::{http::header::SET_COOKIE, response::Response};
use axum_extra::extract::cookie::Cookie;
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    db::initialize,
    user::{Email, NewUser, PasswordHash, UserID, create_user},
};

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");
    connection
}

/// Insert a user with a placeholder password hash.
#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: Email::new(email).expect("Could not create email."),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        connection,
    )
    .expect("Could not create test user.")
    .id
}

/// Read the whole body of `response` as JSON.
pub(crate) async fn parse_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body.");

    serde_json::from_slice(&body).expect("Response body is not valid JSON.")
}

/// Find the cookie called `name` among the `Set-Cookie` headers of `response`.
pub(crate) fn get_cookie_from_response(response: &Response, name: &str) -> Option<Cookie<'static>> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_owned()).ok())
        .find(|cookie| cookie.name() == name)
}
