//! Request plumbing shared by the workflow routers.

use std::fmt::Display;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::RepositoryError;
use crate::workflows::audit::Actor;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Identity forwarded by the authenticating proxy. Requests without a user id are rejected.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let Some(user_id) = header_value(headers, USER_ID_HEADER) else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "missing signed-in user",
        ));
    };

    let mut actor = Actor::new(user_id);
    if let Some(email) = header_value(headers, USER_EMAIL_HEADER) {
        actor = actor.with_email(email);
    }
    if let Some(name) = header_value(headers, USER_NAME_HEADER) {
        actor = actor.with_name(name);
    }
    Ok(actor)
}

pub fn error_response(status: StatusCode, message: impl Display) -> Response {
    let payload = json!({
        "error": message.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
