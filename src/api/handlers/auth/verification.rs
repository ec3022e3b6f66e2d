//! Email verification endpoints.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::api::gate::CurrentAccount;
use crate::api::handlers::error_response;
use crate::auth::{AuthCore, AuthError};

use super::types::ValidateTokenQuery;

#[utoipa::path(
    get,
    path = "/send-email-verification-token",
    responses(
        (status = 200, description = "Verification code sent", body = String),
        (status = 400, description = "Verification unavailable", body = String),
        (status = 401, description = "Missing or invalid bearer token", body = String)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn send_email_verification_token(
    core: Extension<Arc<AuthCore>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> impl IntoResponse {
    match core.send_email_verification_token(&account.email).await {
        Ok(()) => (
            StatusCode::OK,
            "Email verification code sent.".to_string(),
        )
            .into_response(),
        // Missing accounts and already-verified accounts share one message so
        // the endpoint says nothing about which condition held.
        Err(AuthError::NotFound | AuthError::AlreadyVerified) => (
            StatusCode::BAD_REQUEST,
            "Email verification unavailable.".to_string(),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/validate-email-verification-token",
    params(
        ("token" = String, Query, description = "One-time verification code")
    ),
    responses(
        (status = 200, description = "Email verified", body = String),
        (status = 400, description = "Invalid or expired verification code", body = String),
        (status = 401, description = "Missing or invalid bearer token", body = String)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn validate_email_verification_token(
    core: Extension<Arc<AuthCore>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    query: Option<Query<ValidateTokenQuery>>,
) -> impl IntoResponse {
    let Some(Query(query)) = query else {
        return (StatusCode::BAD_REQUEST, "Missing token".to_string()).into_response();
    };

    match core
        .validate_email_verification_token(&query.token, &account.email)
        .await
    {
        Ok(()) => (StatusCode::OK, "Email verified successfully.".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
