//! Password gating for hidden text.
//!
//! A locked payload is `base64(text + "|" + password)`. This is a gate, not
//! encryption: anyone who extracts the payload can decode it and read both
//! the text and the password. Encrypt with [`crate::secretcrypt`] first if the
//! text itself must stay confidential.

use tracing::debug;

use crate::armor;
use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};
use crate::stego::codec;

/// Separates the text from the password inside a locked payload.
pub const SEPARATOR: char = '|';

/// Binds `password` to `text`, producing the payload to embed.
///
/// The text may contain the separator; the password may not, so that the
/// last separator in a payload always marks where the password begins.
///
/// # Errors
///
/// - [`ErrorKind::KeyDerivation`] if `password` contains [`SEPARATOR`].
pub fn lock(text: &str, password: &str) -> Result<String> {
    if password.contains(SEPARATOR) {
        return Err(CipherdeckError::user(
            ErrorKind::KeyDerivation,
            format!("lock password must not contain '{SEPARATOR}'"),
        ));
    }
    Ok(armor::wrap(format!("{text}{SEPARATOR}{password}").as_bytes()))
}

/// Checks `password` against a locked payload and returns the text.
///
/// The payload is split at its last separator and everything after it must
/// equal `password` exactly.
///
/// # Errors
///
/// - [`ErrorKind::Format`] if the payload is not base64 of UTF-8 text.
/// - [`ErrorKind::WrongPassword`] if the payload has no separator or the
///   trailing segment differs from `password`.
pub fn unlock(payload: &str, password: &str) -> Result<String> {
    let decoded = String::from_utf8(armor::unwrap(payload)?).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            "locked payload is not valid UTF-8",
            e,
        )
    })?;

    match decoded.rsplit_once(SEPARATOR) {
        Some((text, stored)) if stored == password => Ok(text.to_owned()),
        _ => Err(CipherdeckError::user(ErrorKind::WrongPassword, "wrong password")),
    }
}

/// Locks `text` with `password` and embeds it in `pixels`.
pub fn embed_locked(pixels: &mut [u8], text: &str, password: &str) -> Result<()> {
    codec::embed(pixels, &lock(text, password)?)
}

/// Extracts and unlocks text hidden with [`embed_locked`].
///
/// An image with no payload yields an empty string, as [`codec::extract`] does.
pub fn extract_locked(pixels: &[u8], password: &str) -> Result<String> {
    let payload = codec::extract(pixels);
    if payload.is_empty() {
        debug!("no locked payload present");
        return Ok(payload);
    }
    unlock(&payload, password)
}
