//! Postgres-backed credential store.
//!
//! Single-use consumption is enforced with guarded single-statement updates:
//! the `WHERE` clause pins the stored code hash, so of two concurrent
//! validations only one can see rows affected.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::store::{Account, CredentialStore, PendingCode, StoreError};

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// A code hash and its expiry are one value: both columns or neither.
fn pending_from_columns(code_hash: Option<String>, expires_at: Option<i64>) -> Option<PendingCode> {
    match (code_hash, expires_at) {
        (Some(code_hash), Some(expires_at)) => Some(PendingCode {
            code_hash,
            expires_at,
        }),
        _ => None,
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = r"
            SELECT email, password_hash, email_verified,
                   verification_code_hash, verification_code_expires_at,
                   reset_code_hash, reset_code_expires_at
            FROM accounts
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account")?;

        Ok(row.map(|row| Account {
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            email_verified: row.get("email_verified"),
            verification_code: pending_from_columns(
                row.get("verification_code_hash"),
                row.get("verification_code_expires_at"),
            ),
            reset_code: pending_from_columns(
                row.get("reset_code_hash"),
                row.get("reset_code_expires_at"),
            ),
        }))
    }

    async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO accounts
                (email, password_hash, email_verified,
                 verification_code_hash, verification_code_expires_at,
                 reset_code_hash, reset_code_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.email_verified)
            .bind(account.verification_code.as_ref().map(|p| &p.code_hash))
            .bind(account.verification_code.as_ref().map(|p| p.expires_at))
            .bind(account.reset_code.as_ref().map(|p| &p.code_hash))
            .bind(account.reset_code.as_ref().map(|p| p.expires_at))
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(StoreError::Backend(
                anyhow::Error::from(err).context("failed to insert account"),
            )),
        }
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let query = r"
            UPDATE accounts
            SET password_hash = $2,
                email_verified = $3,
                verification_code_hash = $4,
                verification_code_expires_at = $5,
                reset_code_hash = $6,
                reset_code_expires_at = $7
            WHERE email = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.email_verified)
            .bind(account.verification_code.as_ref().map(|p| &p.code_hash))
            .bind(account.verification_code.as_ref().map(|p| p.expires_at))
            .bind(account.reset_code.as_ref().map(|p| &p.code_hash))
            .bind(account.reset_code.as_ref().map(|p| p.expires_at))
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update account")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        email: &str,
        expected_code_hash: &str,
    ) -> Result<bool, StoreError> {
        let query = r"
            UPDATE accounts
            SET email_verified = TRUE,
                verification_code_hash = NULL,
                verification_code_expires_at = NULL
            WHERE email = $1
              AND verification_code_hash = $2
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .bind(expected_code_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume verification code")?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_password_reset(
        &self,
        email: &str,
        expected_code_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        let query = r"
            UPDATE accounts
            SET password_hash = $3,
                reset_code_hash = NULL,
                reset_code_expires_at = NULL
            WHERE email = $1
              AND reset_code_hash = $2
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .bind(expected_code_hash)
            .bind(new_password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume reset code")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_account(&self, email: &str) -> Result<bool, StoreError> {
        // Dependents go first, then the account row, in one transaction so a
        // partial deletion is never observable.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin delete transaction")?;

        let query = "DELETE FROM account_likes WHERE account_email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(email)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to delete account likes")?;

        let query = "DELETE FROM accounts WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to delete account")?;

        tx.commit()
            .await
            .context("failed to commit delete transaction")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_requires_both_columns() {
        assert!(pending_from_columns(None, None).is_none());
        assert!(pending_from_columns(Some("hash".to_string()), None).is_none());
        assert!(pending_from_columns(None, Some(1)).is_none());

        let pending = pending_from_columns(Some("hash".to_string()), Some(42));
        assert_eq!(
            pending,
            Some(PendingCode {
                code_hash: "hash".to_string(),
                expires_at: 42,
            })
        );
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
