//! Password reset endpoints. Both are unprotected: the caller proves control
//! of the mailbox with the delivered code, not with a session.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::api::handlers::error_response;
use crate::auth::AuthCore;

use super::types::{ResetPasswordQuery, ResetRequestQuery};

#[utoipa::path(
    put,
    path = "/send-password-reset-token",
    params(
        ("email" = String, Query, description = "Account email")
    ),
    responses(
        (status = 200, description = "Password reset code sent", body = String),
        (status = 400, description = "Account not found", body = String)
    ),
    tag = "auth"
)]
pub async fn send_password_reset_token(
    core: Extension<Arc<AuthCore>>,
    query: Option<Query<ResetRequestQuery>>,
) -> impl IntoResponse {
    let Some(Query(query)) = query else {
        return (StatusCode::BAD_REQUEST, "Missing email".to_string()).into_response();
    };

    match core.send_password_reset_token(&query.email).await {
        Ok(()) => (StatusCode::OK, "Password reset code sent.".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/reset-password",
    params(
        ("newPassword" = String, Query, description = "Replacement password"),
        ("token" = String, Query, description = "One-time reset code"),
        ("email" = String, Query, description = "Account email")
    ),
    responses(
        (status = 200, description = "Password has been reset", body = String),
        (status = 400, description = "Invalid or expired reset code", body = String)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    core: Extension<Arc<AuthCore>>,
    query: Option<Query<ResetPasswordQuery>>,
) -> impl IntoResponse {
    let Some(Query(query)) = query else {
        return (StatusCode::BAD_REQUEST, "Missing parameters".to_string()).into_response();
    };

    if query.new_password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing password.".to_string()).into_response();
    }

    match core
        .reset_password(&query.email, &query.new_password, &query.token)
        .await
    {
        Ok(()) => (StatusCode::OK, "Password has been reset.".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
