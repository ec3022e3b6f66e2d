//! Core flows: registration, login, email verification, password reset.
//!
//! All invariants live here. Collaborators are injected through the
//! constructor; `AuthCore` itself is stateless and shared as one `Arc` across
//! concurrent requests.

use anyhow::anyhow;
use std::sync::Arc;
use tracing::warn;

use super::code;
use super::error::AuthError;
use super::hasher::PasswordHasher;
use super::notify::Notifier;
use super::store::{Account, CredentialStore, PendingCode};
use super::token::{now_unix_seconds, BearerTokenCodec};

/// One-time codes outlive an inbox round trip, not a coffee break.
pub const DEFAULT_CODE_TTL_SECONDS: i64 = 5 * 60;

#[derive(Clone, Copy, Debug)]
pub struct AuthConfig {
    code_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    fn code_ttl_minutes(&self) -> i64 {
        self.code_ttl_seconds / 60
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A bearer session handed to the caller. Not persisted; validity is
/// re-derived from the token itself on each use.
#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
    pub message: String,
}

/// Orchestrates the credential lifecycle over injected collaborators.
pub struct AuthCore {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    codec: BearerTokenCodec,
    notifier: Arc<dyn Notifier>,
    config: AuthConfig,
}

impl AuthCore {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        codec: BearerTokenCodec,
        notifier: Arc<dyn Notifier>,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            codec,
            notifier,
            config,
        }
    }

    #[must_use]
    pub fn codec(&self) -> &BearerTokenCodec {
        &self.codec
    }

    /// Register a new account and return a bearer session for it.
    ///
    /// The verification code is persisted (hashed) in the same durable write
    /// as the account; delivery of the plaintext code happens after and is
    /// best-effort. Duplicate emails are rejected.
    ///
    /// # Errors
    ///
    /// `Conflict` when the email is taken; `Internal` on collaborator failure.
    pub async fn register(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let password_hash = self.hasher.hash(password)?;

        let plaintext_code = code::generate()?;
        let code_hash = self.hasher.hash(&plaintext_code)?;

        let mut account = Account::new(email, password_hash);
        account.verification_code = Some(self.pending(code_hash));
        self.store.insert(&account).await?;

        self.deliver_verification_code(email, &plaintext_code);

        let token = self
            .codec
            .issue(email)
            .map_err(|err| anyhow!("failed to issue session token: {err}"))?;
        Ok(Session {
            token,
            message: "User registered successfully.".to_string(),
        })
    }

    /// Authenticate and return a bearer session.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown email, `InvalidCredentials` for a wrong
    /// password. The boundary shows one message for both so accounts cannot be
    /// enumerated; the kinds stay distinct here.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account = self.lookup(email).await?;

        if !self.hasher.matches(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .codec
            .issue(email)
            .map_err(|err| anyhow!("failed to issue session token: {err}"))?;
        Ok(Session {
            token,
            message: "Authentication succeeded.".to_string(),
        })
    }

    /// Issue a fresh email-verification code, replacing any pending one.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown email, `AlreadyVerified` once the account is
    /// verified.
    pub async fn send_email_verification_token(&self, email: &str) -> Result<(), AuthError> {
        let mut account = self.lookup(email).await?;

        if account.email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let plaintext_code = code::generate()?;
        let code_hash = self.hasher.hash(&plaintext_code)?;
        // Overwrite: at most one pending code per account.
        account.verification_code = Some(self.pending(code_hash));
        self.store.update(&account).await?;

        self.deliver_verification_code(email, &plaintext_code);
        Ok(())
    }

    /// Consume an email-verification code, flipping the account to verified.
    ///
    /// Exactly one of three outcomes, in this order: hash match and unexpired
    /// consumes the code; hash match but expired fails `CodeExpired` with the
    /// fields left in place; anything else fails `CodeMismatch`. Expiry is
    /// only consulted after a positive hash match, so a wrong code is never
    /// reported as expired.
    ///
    /// # Errors
    ///
    /// `NotFound`, `CodeExpired`, or `CodeMismatch` as above.
    pub async fn validate_email_verification_token(
        &self,
        code: &str,
        email: &str,
    ) -> Result<(), AuthError> {
        let account = self.lookup(email).await?;

        let Some(pending) = account.verification_code else {
            return Err(AuthError::CodeMismatch);
        };
        if !self.hasher.matches(code, &pending.code_hash) {
            return Err(AuthError::CodeMismatch);
        }
        if pending.expires_at < now_unix_seconds() {
            return Err(AuthError::CodeExpired);
        }

        // Guarded on the checked hash: a concurrent consumer leaves nothing
        // for us to flip, and we report the same failure as a wrong code.
        let consumed = self
            .store
            .mark_email_verified(email, &pending.code_hash)
            .await?;
        if !consumed {
            return Err(AuthError::CodeMismatch);
        }
        Ok(())
    }

    /// Issue a fresh password-reset code, replacing any pending one. No
    /// verified-state gate.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown email.
    pub async fn send_password_reset_token(&self, email: &str) -> Result<(), AuthError> {
        let mut account = self.lookup(email).await?;

        let plaintext_code = code::generate()?;
        let code_hash = self.hasher.hash(&plaintext_code)?;
        account.reset_code = Some(self.pending(code_hash));
        self.store.update(&account).await?;

        self.deliver_reset_code(email, &plaintext_code);
        Ok(())
    }

    /// Consume a password-reset code and overwrite the stored password.
    ///
    /// Same three-way branch as email verification, against the reset fields;
    /// the password changes only on the consuming outcome.
    ///
    /// # Errors
    ///
    /// `NotFound`, `CodeExpired`, or `CodeMismatch`.
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        code: &str,
    ) -> Result<(), AuthError> {
        let account = self.lookup(email).await?;

        let Some(pending) = account.reset_code else {
            return Err(AuthError::CodeMismatch);
        };
        if !self.hasher.matches(code, &pending.code_hash) {
            return Err(AuthError::CodeMismatch);
        }
        if pending.expires_at < now_unix_seconds() {
            return Err(AuthError::CodeExpired);
        }

        let new_password_hash = self.hasher.hash(new_password)?;
        let consumed = self
            .store
            .apply_password_reset(email, &pending.code_hash, &new_password_hash)
            .await?;
        if !consumed {
            return Err(AuthError::CodeMismatch);
        }
        Ok(())
    }

    /// Pure lookup, used by the request gate and the profile endpoint.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown email.
    pub async fn get_account(&self, email: &str) -> Result<Account, AuthError> {
        self.lookup(email).await
    }

    /// Remove the account and its dependent records in one atomic unit.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing was deleted.
    pub async fn delete_account(&self, email: &str) -> Result<(), AuthError> {
        let deleted = self.store.delete_account(email).await?;
        if !deleted {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn lookup(&self, email: &str) -> Result<Account, AuthError> {
        self.store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)
    }

    fn pending(&self, code_hash: String) -> PendingCode {
        PendingCode {
            code_hash,
            expires_at: now_unix_seconds().saturating_add(self.config.code_ttl_seconds()),
        }
    }

    fn deliver_verification_code(&self, email: &str, plaintext_code: &str) {
        let body = format!(
            "Enter this code to verify your email: {plaintext_code}. \
             The code will expire in {} minutes.",
            self.config.code_ttl_minutes()
        );
        if let Err(err) = self.notifier.send_email(email, "Email Verification", &body) {
            warn!("Error while sending email: {err}");
        }
    }

    fn deliver_reset_code(&self, email: &str, plaintext_code: &str) {
        let body = format!(
            "You requested a password reset.\n\n\
             Enter this code to reset your password: {plaintext_code}. \
             The code will expire in {} minutes.",
            self.config.code_ttl_minutes()
        );
        if let Err(err) = self.notifier.send_email(email, "Password Reset", &body) {
            warn!("Error while sending email: {err}");
        }
    }
}
