//! One-way hashing for stored credentials and one-time codes.
//!
//! The same primitive covers login passwords and 5-digit codes, so the
//! implementation must tolerate short numeric inputs as well as passphrases.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHasher as _, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use rand::rngs::OsRng;

/// One-way hash and verify for secrets.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext secret. Salts internally, so two calls on the same
    /// input yield different outputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the hashing primitive fails.
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Verify a plaintext secret against a stored hash.
    ///
    /// Never errors: a malformed stored hash verifies as `false`.
    fn matches(&self, plaintext: &str, hashed: &str) -> bool;
}

/// Argon2id hasher producing PHC-format strings.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash credential: {err}"))?;
        Ok(hash.to_string())
    }

    fn matches(&self, plaintext: &str, hashed: &str) -> bool {
        // Verification is constant-time inside argon2.
        let Ok(parsed) = PasswordHash::new(hashed) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
