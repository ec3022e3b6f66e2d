//! Credential lifecycle and token state machine.
//!
//! `AuthCore` orchestrates the collaborators defined here: a one-way
//! [`PasswordHasher`], the [`BearerTokenCodec`], the [`CredentialStore`]
//! persistence seam, and the best-effort [`Notifier`] delivery channel.

pub mod code;
pub mod core;
pub mod error;
pub mod hasher;
pub mod notify;
pub mod pg;
pub mod store;
pub mod token;

pub use self::core::{AuthConfig, AuthCore, Session};
pub use self::error::AuthError;
pub use self::hasher::{Argon2Hasher, PasswordHasher};
pub use self::notify::{LogNotifier, Notifier};
pub use self::pg::PgCredentialStore;
pub use self::store::{Account, CredentialStore, MemoryCredentialStore, PendingCode, StoreError};
pub use self::token::{BearerTokenCodec, TokenError};
