//! Textual armoring for binary data
//!
//! Every blob this crate hands to callers (symmetric envelopes, public-key
//! ciphertexts, exported keys) is plain standard base64 with padding. There
//! is no prefix, version marker or container around it, so blobs produced by
//! other implementations of the same layout decode unchanged.

use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Wrap bytes in armor, returning the base64 string
pub fn wrap(body: &[u8]) -> String {
    STANDARD.encode(body)
}

/// Unwrap an armored string, returning the original bytes
///
/// Leading and trailing whitespace is ignored so that values pasted from a
/// terminal or read from a file with a trailing newline still decode.
pub fn unwrap(armored: &str) -> Result<Vec<u8>> {
    STANDARD.decode(armored.trim()).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}
