//! Hybrid encryption: a fresh symmetric session key per message, itself
//! encrypted under the recipient's public key.
//!
//! The session key is 32 random bytes, base64 encoded, and that base64 text
//! is used verbatim as the password for [`crate::secretcrypt`]. The same
//! text is what gets RSA-OAEP encrypted. This lifts the OAEP payload ceiling:
//! the only thing the public-key scheme ever carries is the 44-byte session
//! key string.

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::armor;
use crate::asymmetric;
use crate::error::{CipherdeckError, ErrorKind, Result};
use crate::secretcrypt;

/// Raw session key length in bytes.
pub const SESSION_KEY_LEN: usize = 32;

/// Output of [`encrypt`]. Both halves are needed to decrypt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridResult {
    /// Base64 symmetric envelope over the plaintext.
    pub symmetric_envelope: String,
    /// Base64 RSA-OAEP ciphertext over the base64 session key.
    pub encrypted_session_key: String,
}

/// Encrypts text of any length for the holder of `public_key`.
pub fn encrypt(plaintext: &str, public_key: &str) -> Result<HybridResult> {
    let mut raw = Zeroizing::new([0u8; SESSION_KEY_LEN]);
    OsRng.fill_bytes(&mut *raw);
    let session_key = Zeroizing::new(armor::wrap(&*raw));
    debug!(len = plaintext.len(), "hybrid encrypt");

    let symmetric_envelope = secretcrypt::encrypt(plaintext, &session_key)?;
    let encrypted_session_key = asymmetric::encrypt(&session_key, public_key)?;

    Ok(HybridResult {
        symmetric_envelope,
        encrypted_session_key,
    })
}

/// Recovers the plaintext of a [`HybridResult`] with the matching private key.
///
/// # Errors
///
/// - [`ErrorKind::MissingSessionKey`] if `encrypted_session_key` is absent or empty.
/// - [`ErrorKind::DecryptionFailed`] if the session key cannot be recovered.
/// - [`ErrorKind::AuthenticationFailed`] if the envelope does not verify
///   under the recovered session key.
pub fn decrypt(
    symmetric_envelope: &str,
    private_key: &str,
    encrypted_session_key: Option<&str>,
) -> Result<String> {
    let encrypted_session_key = encrypted_session_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            CipherdeckError::user(
                ErrorKind::MissingSessionKey,
                "hybrid decryption requires the encrypted session key",
            )
        })?;
    debug!("hybrid decrypt");

    let session_key = Zeroizing::new(asymmetric::decrypt(encrypted_session_key, private_key)?);
    secretcrypt::decrypt(symmetric_envelope, &session_key)
}

impl HybridResult {
    /// Convenience for [`decrypt`] on a result held as one value.
    pub fn decrypt(&self, private_key: &str) -> Result<String> {
        decrypt(
            &self.symmetric_envelope,
            private_key,
            Some(&self.encrypted_session_key),
        )
    }
}
