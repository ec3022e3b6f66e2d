//! Authenticated account endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::gate::CurrentAccount;
use crate::api::handlers::error_response;
use crate::auth::AuthCore;

use super::auth::types::AccountResponse;

#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Return the authenticated account profile", body = AccountResponse),
        (status = 401, description = "Missing or invalid bearer token", body = String)
    ),
    security(("bearer_token" = [])),
    tag = "user"
)]
pub async fn profile(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(AccountResponse {
            email: account.email.clone(),
            email_verified: account.email_verified,
        }),
    )
}

#[utoipa::path(
    delete,
    path = "/user",
    responses(
        (status = 200, description = "Account deleted", body = String),
        (status = 401, description = "Missing or invalid bearer token", body = String)
    ),
    security(("bearer_token" = [])),
    tag = "user"
)]
pub async fn delete(
    core: Extension<Arc<AuthCore>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> impl IntoResponse {
    match core.delete_account(&account.email).await {
        Ok(()) => (StatusCode::OK, "Account deleted.".to_string()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Account;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn profile_echoes_the_gated_account() {
        let account = Account::new("alice@example.com", "hash");
        let response = profile(Extension(CurrentAccount(account)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
