use thiserror::Error;

use super::store::StoreError;

/// Failure kinds surfaced by [`super::AuthCore`] operations.
///
/// The boundary maps kinds to status codes; some kinds share one user-visible
/// message there (login flattens `NotFound`/`InvalidCredentials`) while staying
/// distinguishable here for logging and tests.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Account not found.")]
    NotFound,
    #[error("Password is incorrect.")]
    InvalidCredentials,
    #[error("Email is already verified.")]
    AlreadyVerified,
    #[error("Verification code is invalid.")]
    CodeMismatch,
    #[error("Verification code has expired.")]
    CodeExpired,
    #[error("An account with this email already exists.")]
    Conflict,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::NotFound => Self::NotFound,
            StoreError::Backend(err) => Self::Internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err = AuthError::from(StoreError::Conflict);
        assert!(matches!(err, AuthError::Conflict));
    }

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err = AuthError::from(StoreError::NotFound);
        assert!(matches!(err, AuthError::NotFound));
    }

    #[test]
    fn store_backend_maps_to_internal() {
        let err = AuthError::from(StoreError::Backend(anyhow::anyhow!("boom")));
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
