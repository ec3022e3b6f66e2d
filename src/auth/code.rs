//! One-time code generation.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};

/// Codes are short enough to copy from an email by hand.
pub const CODE_LENGTH: usize = 5;

// Largest multiple of 10 that fits in a byte; values at or above it are
// rejected so each digit stays uniform.
const REJECTION_BOUND: u8 = 250;

/// Generate a fixed-length decimal code from the OS CSPRNG.
///
/// Each digit is drawn independently; leading zeros are kept, so "00042" is a
/// valid code and must be compared as an exact string.
///
/// # Errors
///
/// Returns an error if the random source fails.
pub fn generate() -> Result<String> {
    let mut code = String::with_capacity(CODE_LENGTH);
    let mut buf = [0u8; 16];
    while code.len() < CODE_LENGTH {
        OsRng
            .try_fill_bytes(&mut buf)
            .context("failed to draw one-time code bytes")?;
        for byte in buf {
            if code.len() == CODE_LENGTH {
                break;
            }
            if byte < REJECTION_BOUND {
                code.push(char::from(b'0' + byte % 10));
            }
        }
    }
    Ok(code)
}
