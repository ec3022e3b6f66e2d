//! Request gate for protected routes.
//!
//! Runs once per inbound call. Unsecured operations bypass it through an
//! explicit allow-list; everything else must present a valid bearer token that
//! resolves to a live account. All rejection sub-cases (missing header, wrong
//! scheme, forged or expired token, deleted account) collapse into one 401
//! with a single generic message, so the response never works as a token
//! oracle. The sub-cases stay visible in debug logs.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{Account, AuthCore};

/// Operations that never carry credentials.
const UNSECURED_ROUTES: &[&str] = &[
    "/register",
    "/login",
    "/send-password-reset-token",
    "/reset-password",
];

/// Infrastructure routes outside the credential lifecycle.
const OPEN_PREFIXES: &[&str] = &["/docs", "/api-docs"];

/// The authenticated account, attached to the request for downstream handlers.
#[derive(Clone, Debug)]
pub struct CurrentAccount(pub Account);

pub async fn gate(
    Extension(core): Extension<Arc<AuthCore>>,
    mut request: Request,
    next: Next,
) -> Response {
    // Preflight is answered by the CORS layer; never challenge it.
    if request.method() == Method::OPTIONS || is_unsecured(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()) else {
        return unauthorized();
    };

    let subject = match core.codec().validate(&token) {
        Ok(subject) => subject,
        Err(err) => {
            debug!("Bearer token rejected: {err}");
            return unauthorized();
        }
    };

    // An account deleted after token issuance is the same as a bad token.
    let account = match core.get_account(&subject).await {
        Ok(account) => account,
        Err(err) => {
            debug!("Bearer subject rejected: {err}");
            return unauthorized();
        }
    };

    request.extensions_mut().insert(CurrentAccount(account));
    next.run(request).await
}

fn is_unsecured(path: &str) -> bool {
    if UNSECURED_ROUTES.contains(&path) || path == "/" || path == "/health" {
        return true;
    }
    OPEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "message": "Invalid authentication token, or token missing."
        })),
    )
        .into_response()
}
