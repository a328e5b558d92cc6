//! HMAC-SHA256 message authentication codes over text.
//!
//! Both the text and the secret are taken as their UTF-8 bytes. Tags are
//! lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};

/// HMAC-SHA256 type alias.
type HmacSha256 = Hmac<Sha256>;

/// Fixed output length of HMAC-SHA256 in bytes.
pub const HMAC_SHA256_LEN: usize = 32;

fn keyed(secret: &str) -> Result<HmacSha256> {
    if secret.is_empty() {
        return Err(CipherdeckError::user(
            ErrorKind::EmptySecret,
            "HMAC secret must not be empty",
        ));
    }
    // HMAC accepts keys of any length; this only fails on a broken primitive.
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
        CipherdeckError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            format!("HMAC-SHA256 key init failed: {e}"),
        )
    })
}

/// Computes the hex-encoded HMAC-SHA256 of `text` under `secret`.
///
/// # Errors
///
/// [`ErrorKind::EmptySecret`] if `secret` is empty.
pub fn hmac(text: &str, secret: &str) -> Result<String> {
    debug!(len = text.len(), "computing HMAC-SHA256");
    let mut mac = keyed(secret)?;
    mac.update(text.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex-encoded HMAC-SHA256 tag in constant time.
///
/// Returns `Ok(false)` for a well-formed tag that does not match, and a
/// [`ErrorKind::Format`] error if `expected_hex` is not a 32-byte hex value.
pub fn verify(text: &str, secret: &str, expected_hex: &str) -> Result<bool> {
    let expected = hex::decode(expected_hex.trim()).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            "expected tag is not valid hex",
            e,
        )
    })?;
    if expected.len() != HMAC_SHA256_LEN {
        return Err(CipherdeckError::user(
            ErrorKind::Format,
            format!(
                "expected tag is {} bytes, HMAC-SHA256 tags are {}",
                expected.len(),
                HMAC_SHA256_LEN
            ),
        ));
    }
    let mut mac = keyed(secret)?;
    mac.update(text.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}
