//! Outbound delivery abstraction.
//!
//! Delivery is best-effort by contract: callers attempt it only after account
//! state is durably persisted, and a failed send never fails the enclosing
//! operation.

use anyhow::Result;
use tracing::info;

/// Out-of-band delivery of a message to a user.
pub trait Notifier: Send + Sync {
    /// Deliver a message or return an error; callers log and swallow failures.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery fails.
    fn send_email(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Local dev notifier that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_email(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        info!(
            recipient = %recipient,
            subject = %subject,
            body = %body,
            "email send stub"
        );
        Ok(())
    }
}
