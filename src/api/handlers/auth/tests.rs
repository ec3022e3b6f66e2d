use super::types::{CredentialsRequest, ResetPasswordQuery, ResetRequestQuery};
use super::{login, register, reset};
use crate::api::gate::CurrentAccount;
use crate::api::handlers::auth::verification;
use crate::auth::{
    Argon2Hasher, AuthConfig, AuthCore, BearerTokenCodec, MemoryCredentialStore, Notifier,
};
use anyhow::{anyhow, Context, Result};
use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use regex::Regex;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn last_code(&self) -> Result<String> {
        let sent = self
            .sent
            .lock()
            .map_err(|_| anyhow!("notifier lock poisoned"))?;
        let body = sent.last().context("no email recorded")?;
        let code = Regex::new(r"\b[0-9]{5}\b")?
            .find(body)
            .context("no code in email body")?;
        Ok(code.as_str().to_string())
    }
}

impl Notifier for RecordingNotifier {
    fn send_email(&self, _recipient: &str, _subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("notifier lock poisoned"))?
            .push(body.to_string());
        Ok(())
    }
}

struct Harness {
    core: Arc<AuthCore>,
    notifier: Arc<RecordingNotifier>,
}

fn harness() -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let core = Arc::new(AuthCore::new(
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(Argon2Hasher::default()),
        BearerTokenCodec::new(SecretString::from("testa sekreto".to_string())),
        notifier.clone(),
        AuthConfig::new(),
    ));
    Harness { core, notifier }
}

fn credentials(email: &str, password: &str) -> Option<Json<CredentialsRequest>> {
    Some(Json(CredentialsRequest {
        email: email.to_string(),
        password: password.to_string(),
    }))
}

async fn body_string(response: axum::response::Response) -> Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .context("failed to read response body")?;
    String::from_utf8(bytes.to_vec()).context("response body is not utf-8")
}

async fn current_account(core: &AuthCore, email: &str) -> Result<Extension<CurrentAccount>> {
    let account = core.get_account(email).await?;
    Ok(Extension(CurrentAccount(account)))
}

#[tokio::test]
async fn register_missing_payload() {
    let h = harness();
    let response = register(Extension(h.core), None).await.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_bad_email_and_empty_password() {
    let h = harness();

    let response = register(
        Extension(h.core.clone()),
        credentials("not-an-email", "pw"),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = register(Extension(h.core), credentials("a@x.com", ""))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_created_then_conflict() {
    let h = harness();

    let response = register(Extension(h.core.clone()), credentials("a@x.com", "pw"))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = register(Extension(h.core), credentials("a@x.com", "pw"))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_hides_whether_the_account_exists() -> Result<()> {
    let h = harness();
    register(Extension(h.core.clone()), credentials("a@x.com", "pw")).await;

    let wrong_password = login(Extension(h.core.clone()), credentials("a@x.com", "nope"))
        .await
        .into_response();
    let unknown_account = login(Extension(h.core), credentials("ghost@x.com", "pw"))
        .await
        .into_response();

    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown_account.status(), StatusCode::BAD_REQUEST);
    // Same status is not enough; the bodies must be indistinguishable too.
    assert_eq!(
        body_string(wrong_password).await?,
        body_string(unknown_account).await?
    );
    Ok(())
}

#[tokio::test]
async fn login_succeeds_with_valid_credentials() {
    let h = harness();
    register(Extension(h.core.clone()), credentials("a@x.com", "pw")).await;

    let response = login(Extension(h.core), credentials("a@x.com", "pw"))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn verification_endpoints_drive_the_code_lifecycle() -> Result<()> {
    let h = harness();
    register(Extension(h.core.clone()), credentials("a@x.com", "pw")).await;

    let response = verification::send_email_verification_token(
        Extension(h.core.clone()),
        current_account(&h.core, "a@x.com").await?,
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let code = h.notifier.last_code()?;
    let response = verification::validate_email_verification_token(
        Extension(h.core.clone()),
        current_account(&h.core, "a@x.com").await?,
        Some(Query(super::types::ValidateTokenQuery { token: code })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    // Verified now: another send is refused.
    let response = verification::send_email_verification_token(
        Extension(h.core.clone()),
        current_account(&h.core, "a@x.com").await?,
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn validate_without_token_is_bad_request() -> Result<()> {
    let h = harness();
    register(Extension(h.core.clone()), credentials("a@x.com", "pw")).await;

    let response = verification::validate_email_verification_token(
        Extension(h.core.clone()),
        current_account(&h.core, "a@x.com").await?,
        None,
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn reset_endpoints_change_the_password() -> Result<()> {
    let h = harness();
    register(Extension(h.core.clone()), credentials("a@x.com", "old-pw")).await;

    let response = reset::send_password_reset_token(
        Extension(h.core.clone()),
        Some(Query(ResetRequestQuery {
            email: "a@x.com".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let code = h.notifier.last_code()?;
    let response = reset::reset_password(
        Extension(h.core.clone()),
        Some(Query(ResetPasswordQuery {
            new_password: "new-pw".to_string(),
            token: code,
            email: "a@x.com".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let response = login(Extension(h.core.clone()), credentials("a@x.com", "old-pw"))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = login(Extension(h.core), credentials("a@x.com", "new-pw"))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn reset_for_unknown_account_fails() {
    let h = harness();
    let response = reset::send_password_reset_token(
        Extension(h.core),
        Some(Query(ResetRequestQuery {
            email: "ghost@x.com".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
