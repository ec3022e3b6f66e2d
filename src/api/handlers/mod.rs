//! API handlers and shared utilities.

pub mod auth;
pub mod health;
pub mod root;
pub mod user;

use axum::http::StatusCode;
use regex::Regex;
use tracing::error;

use crate::auth::AuthError;

/// Lightweight email sanity check used before any credential work.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Map a core failure to a status and user-visible message.
///
/// Internal errors are logged here and replaced with a generic body.
pub(crate) fn error_response(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::NotFound
        | AuthError::InvalidCredentials
        | AuthError::AlreadyVerified
        | AuthError::CodeMismatch
        | AuthError::CodeExpired => (StatusCode::BAD_REQUEST, err.to_string()),
        AuthError::Conflict => (StatusCode::CONFLICT, err.to_string()),
        AuthError::Internal(inner) => {
            error!("Internal error: {inner}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }

    #[test]
    fn conflict_maps_to_409() {
        let (status, _) = error_response(&AuthError::Conflict);
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn code_failures_map_to_400() {
        for err in [
            AuthError::NotFound,
            AuthError::InvalidCredentials,
            AuthError::AlreadyVerified,
            AuthError::CodeMismatch,
            AuthError::CodeExpired,
        ] {
            let (status, message) = error_response(&err);
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn internal_errors_are_not_echoed() {
        let (status, message) = error_response(&AuthError::Internal(anyhow!("db exploded")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("db exploded"));
    }
}
