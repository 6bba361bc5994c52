//! The JSON envelope shared by every API response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The body of every API response.
///
/// `error` is `false` and `data` holds the payload for successful requests.
/// For failed requests `error` is `true`, `message` explains the problem and
/// `data` is `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub error: bool,
    pub message: String,
    pub data: Option<T>,
}

/// A 200 OK response carrying `data`.
pub fn success<T: Serialize>(message: &str, data: T) -> Response {
    respond(StatusCode::OK, message, Some(data))
}

/// A 201 Created response carrying the created resource.
pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    respond(StatusCode::CREATED, message, Some(data))
}

/// A 200 OK response with `null` data.
pub fn success_without_data(message: &str) -> Response {
    respond::<()>(StatusCode::OK, message, None)
}

/// An error response with `null` data.
pub fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            error: true,
            message: message.to_owned(),
            data: None,
        }),
    )
        .into_response()
}

fn respond<T: Serialize>(status: StatusCode, message: &str, data: Option<T>) -> Response {
    (
        status,
        Json(ApiResponse {
            error: false,
            message: message.to_owned(),
            data,
        }),
    )
        .into_response()
}
