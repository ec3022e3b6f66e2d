//! # Sigilo (Credential & Identity Verification Service)
//!
//! `sigilo` registers user accounts, authenticates logins, issues bearer
//! session tokens, and manages the two time-boxed one-time-code flows (email
//! verification and password reset).
//!
//! ## Credential lifecycle
//!
//! Passwords and one-time codes are never stored in cleartext; both go through
//! the same Argon2id hasher. Bearer tokens are signed, self-contained, and
//! re-validated on every use; there is no session table to consult or revoke.
//!
//! ## One-time codes
//!
//! - **Single use:** a code is consumed by a guarded store update keyed on the
//!   stored hash, so two concurrent validations of the same code cannot both
//!   succeed.
//! - **Expiry:** codes carry an absolute expiry set at issuance and checked at
//!   validation time only after the hash has matched. A wrong code is never
//!   reported as expired.
//! - **Overwrite:** requesting a fresh code replaces any pending one; at most
//!   one code per account and flow is live at a time.
//!
//! ## Delivery
//!
//! Outbound code delivery is best-effort: it runs after the account state is
//! durably persisted and a failed send is logged, never surfaced.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
