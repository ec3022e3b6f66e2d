//! Account model and the persistence seam.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

/// A pending one-time code: the stored hash and its absolute expiry.
///
/// Hash and expiry live in one optional value so they are set and cleared
/// together: both present or both absent, never one without the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingCode {
    pub code_hash: String,
    /// Unix seconds; evaluated lazily at validation time.
    pub expires_at: i64,
}

/// One registered user. Email is the sole lookup key.
#[derive(Clone, Debug)]
pub struct Account {
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub verification_code: Option<PendingCode>,
    pub reset_code: Option<PendingCode>,
}

impl Account {
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            email_verified: false,
            verification_code: None,
            reset_code: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account already exists")]
    Conflict,
    #[error("account not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Durable account records, looked up and updated by email.
///
/// The consume operations are guarded: they apply only while the stored code
/// hash still equals the value the caller checked, so concurrent validations
/// of one code cannot both succeed.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Persist a new account. Fails with [`StoreError::Conflict`] when the
    /// email is already taken.
    async fn insert(&self, account: &Account) -> Result<(), StoreError>;

    /// Overwrite an existing account. Fails with [`StoreError::NotFound`] when
    /// the email is unknown.
    async fn update(&self, account: &Account) -> Result<(), StoreError>;

    /// Atomically mark the account verified and clear its verification code,
    /// guarded on the stored code hash. Returns whether a row changed.
    async fn mark_email_verified(
        &self,
        email: &str,
        expected_code_hash: &str,
    ) -> Result<bool, StoreError>;

    /// Atomically replace the password and clear the reset code, guarded on
    /// the stored code hash. Returns whether a row changed.
    async fn apply_password_reset(
        &self,
        email: &str,
        expected_code_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError>;

    /// Remove the account and its dependent records in one atomic unit.
    /// Returns whether an account row was removed.
    async fn delete_account(&self, email: &str) -> Result<bool, StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    accounts: HashMap<String, Account>,
    /// Dependent rows (liked post ids per account), removed with the account.
    likes: HashMap<String, Vec<String>>,
}

/// In-memory store for local development and tests.
///
/// A single lock over all state makes every guarded operation atomic, which is
/// what the Postgres store achieves with guarded single-statement updates.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dependent row for the account, as the likes table would.
    pub async fn add_like(&self, email: &str, post_id: &str) {
        let mut inner = self.inner.lock().await;
        inner
            .likes
            .entry(email.to_string())
            .or_default()
            .push(post_id.to_string());
    }

    pub async fn likes_for(&self, email: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.likes.get(email).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.get(email).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.accounts.contains_key(&account.email) {
            return Err(StoreError::Conflict);
        }
        inner
            .accounts
            .insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(existing) = inner.accounts.get_mut(&account.email) else {
            return Err(StoreError::NotFound);
        };
        *existing = account.clone();
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        email: &str,
        expected_code_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(account) = inner.accounts.get_mut(email) else {
            return Ok(false);
        };
        match &account.verification_code {
            Some(pending) if pending.code_hash == expected_code_hash => {
                account.email_verified = true;
                account.verification_code = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply_password_reset(
        &self,
        email: &str,
        expected_code_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(account) = inner.accounts.get_mut(email) else {
            return Ok(false);
        };
        match &account.reset_code {
            Some(pending) if pending.code_hash == expected_code_hash => {
                account.password_hash = new_password_hash.to_string();
                account.reset_code = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_account(&self, email: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.likes.remove(email);
        Ok(inner.accounts.remove(email).is_some())
    }
}
