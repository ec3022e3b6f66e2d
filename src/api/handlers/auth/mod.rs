//! Registration and login endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::handlers::{error_response, valid_email};
use crate::auth::{AuthCore, AuthError};

pub mod reset;
pub mod types;
pub mod verification;

#[cfg(test)]
mod tests;

use types::{CredentialsRequest, SessionResponse};

#[utoipa::path(
    post,
    path = "/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Registration successful", body = SessionResponse),
        (status = 400, description = "Missing or invalid payload", body = String),
        (status = 409, description = "An account with this email already exists", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    core: Extension<Arc<AuthCore>>,
    payload: Option<Json<CredentialsRequest>>,
) -> impl IntoResponse {
    let request: CredentialsRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if !valid_email(&request.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email address.".to_string()).into_response();
    }
    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing password.".to_string()).into_response();
    }

    match core.register(&request.email, &request.password).await {
        Ok(session) => (
            StatusCode::CREATED,
            Json(SessionResponse {
                token: session.token,
                message: session.message,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Authentication succeeded", body = SessionResponse),
        (status = 400, description = "Invalid email or password", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    core: Extension<Arc<AuthCore>>,
    payload: Option<Json<CredentialsRequest>>,
) -> impl IntoResponse {
    let request: CredentialsRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match core.login(&request.email, &request.password).await {
        Ok(session) => (
            StatusCode::OK,
            Json(SessionResponse {
                token: session.token,
                message: session.message,
            }),
        )
            .into_response(),
        // One message for unknown accounts and wrong passwords, so the login
        // form cannot be used to enumerate registered emails.
        Err(AuthError::NotFound | AuthError::InvalidCredentials) => (
            StatusCode::BAD_REQUEST,
            "Invalid email or password.".to_string(),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
