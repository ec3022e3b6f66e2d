//! Bearer session token codec.
//!
//! Tokens are compact JWS-shaped strings (`header.claims.signature`, base64url
//! without padding) signed with HMAC-SHA-256. A token embeds the subject email
//! plus issued-at/expires-at timestamps and is re-validated on every use; there
//! is no server-side session state.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::SystemTime;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Session tokens outlive a working day but not a calendar day.
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct BearerTokenHeader {
    alg: String,
    typ: String,
}

impl BearerTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BearerClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Whether this failure is the well-formed-but-lapsed kind, as opposed to
    /// an unparseable or forged token.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Unix seconds for token issuance and TTL validation.
pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Issues and validates signed, expiring session tokens bound to an account
/// email.
pub struct BearerTokenCodec {
    secret: SecretString,
    ttl_seconds: i64,
}

impl BearerTokenCodec {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Create a signed token for the subject, expiring a fixed duration from
    /// now.
    ///
    /// # Errors
    ///
    /// Returns an error if claims cannot be encoded or the key is rejected.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, now_unix_seconds())
    }

    /// Like [`Self::issue`] with an explicit issuance time.
    ///
    /// # Errors
    ///
    /// Returns an error if claims cannot be encoded or the key is rejected.
    pub fn issue_at(&self, subject: &str, now_unix: i64) -> Result<String, TokenError> {
        let claims = BearerClaims {
            sub: subject.to_string(),
            iat: now_unix,
            exp: now_unix.saturating_add(self.ttl_seconds),
        };

        let header_b64 = b64e_json(&BearerTokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Validate a token and return its subject.
    ///
    /// # Errors
    ///
    /// Returns `Expired` for a well-formed token past its expiry and another
    /// [`TokenError`] kind for anything unparseable or forged.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        self.validate_at(token, now_unix_seconds())
            .map(|claims| claims.sub)
    }

    /// Like [`Self::validate`] with an explicit clock, returning the full
    /// claims.
    ///
    /// Signature integrity is always checked before expiry.
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub fn validate_at(&self, token: &str, now_unix: i64) -> Result<BearerClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        if parts.next().is_some() {
            return Err(TokenError::TokenFormat);
        }

        let header: BearerTokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        // verify_slice compares in constant time.
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: BearerClaims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> BearerTokenCodec {
        BearerTokenCodec::new(SecretString::from("la sekreta signo".to_string()))
    }

    #[test]
    fn issue_and_validate_round_trip() -> Result<(), TokenError> {
        let codec = codec();
        let token = codec.issue_at("alice@example.com", NOW)?;
        let claims = codec.validate_at(&token, NOW + 60)?;
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + DEFAULT_SESSION_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn expired_token_is_expired_not_invalid() -> Result<(), TokenError> {
        let codec = codec().with_ttl_seconds(120);
        let token = codec.issue_at("alice@example.com", NOW)?;

        let result = codec.validate_at(&token, NOW + 121);
        assert!(matches!(result, Err(TokenError::Expired)));

        // Exactly at expiry is already lapsed.
        let result = codec.validate_at(&token, NOW + 120);
        assert!(matches!(result, Err(TokenError::Expired)));

        let claims = codec.validate_at(&token, NOW + 119)?;
        assert_eq!(claims.sub, "alice@example.com");
        Ok(())
    }

    #[test]
    fn tampered_payload_fails_signature_check() -> Result<(), TokenError> {
        let codec = codec();
        let token = codec.issue_at("alice@example.com", NOW)?;

        // Flip one character of the claims segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut claims = parts[1].clone().into_bytes();
        claims[0] = if claims[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(claims).map_err(|_| TokenError::Base64)?;
        let tampered = parts.join(".");

        let result = codec.validate_at(&tampered, NOW);
        assert!(matches!(
            result,
            Err(TokenError::InvalidSignature | TokenError::Base64 | TokenError::Json(_))
        ));
        Ok(())
    }

    #[test]
    fn wrong_secret_fails_signature_check() -> Result<(), TokenError> {
        let token = codec().issue_at("alice@example.com", NOW)?;
        let other = BearerTokenCodec::new(SecretString::from("alia sekreto".to_string()));
        let result = other.validate_at(&token, NOW);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn garbage_is_token_format_error() {
        let codec = codec();
        assert!(matches!(
            codec.validate_at("garbage", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            codec.validate_at("a.b.c.d", NOW),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            codec.validate_at("!!.!!.!!", NOW),
            Err(TokenError::Base64)
        ));
    }

    #[test]
    fn expired_is_distinguishable() {
        assert!(TokenError::Expired.is_expired());
        assert!(!TokenError::InvalidSignature.is_expired());
        assert!(!TokenError::TokenFormat.is_expired());
    }
}
