//! Password based encryption using PBKDF2 + AES-256-GCM
//!
//! This module implements password based authenticated encryption using:
//! - PBKDF2-HMAC-SHA256 for key derivation from the password (see [`crate::kdf`])
//! - AES-256-GCM for authenticated encryption
//!
//! The binary envelope format is:
//! - salt: 16 bytes
//! - nonce: 12 bytes
//! - ciphertext: variable length, with the 16-byte GCM tag as its trailer
//!
//! There is no length field, version byte or iteration count in the
//! envelope; decryption slices it positionally. Callers see the envelope as
//! one standard base64 string (see [`crate::armor`]).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::armor;
use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{self, KdfParams, SALT_LEN};

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Smallest byte length an envelope can have and still be sliced.
pub const MIN_ENVELOPE_LEN: usize = SALT_LEN + NONCE_LEN;

/// Encrypt text with a password, returning the base64 envelope.
///
/// Uses the default [`KdfParams`].
pub fn encrypt(plaintext: &str, password: &str) -> Result<String> {
    encrypt_with(plaintext, password, &KdfParams::default())
}

/// Decrypt a base64 envelope produced by [`encrypt`].
pub fn decrypt(envelope: &str, password: &str) -> Result<String> {
    decrypt_with(envelope, password, &KdfParams::default())
}

/// [`encrypt`] with explicit key derivation parameters.
pub fn encrypt_with(plaintext: &str, password: &str, params: &KdfParams) -> Result<String> {
    let sealed = seal(password.as_bytes(), plaintext.as_bytes(), params)?;
    Ok(armor::wrap(&sealed))
}

/// [`decrypt`] with explicit key derivation parameters.
///
/// Must be given the same parameters the envelope was sealed with.
pub fn decrypt_with(envelope: &str, password: &str, params: &KdfParams) -> Result<String> {
    let sealed = armor::unwrap(envelope)?;
    let plaintext = open(password.as_bytes(), &sealed, params)?;
    String::from_utf8(plaintext).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Format,
            "decrypted data is not valid UTF-8 text",
            e,
        )
    })
}

/// Encrypt bytes with a password using random salt and nonce
///
/// Returns the binary format: salt(16) + nonce(12) + ciphertext+tag(variable)
pub fn seal(password: &[u8], plaintext: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_deterministic(password, plaintext, &salt, &nonce, params)
}

/// Encrypt bytes with a password using provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `seal()` which generates random salt/nonce.
pub fn seal_deterministic(
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    params: &KdfParams,
) -> Result<Vec<u8>> {
    debug!(len = plaintext.len(), "sealing envelope");
    let key = kdf::derive_key(password, salt, params)?;

    let cipher = Aes256Gcm::new((&*key).into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| {
            CipherdeckError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "encryption failed",
            )
        })?;

    let mut output = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    output.extend_from_slice(salt);
    output.extend_from_slice(nonce);
    output.extend_from_slice(&ciphertext);

    Ok(output)
}

/// Decrypt an envelope with a password
pub fn open(password: &[u8], envelope: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return Err(CipherdeckError::user(
            ErrorKind::Format,
            format!(
                "input likely truncated: envelope is {} bytes, need at least {}",
                envelope.len(),
                MIN_ENVELOPE_LEN
            ),
        ));
    }

    let (salt, rest) = envelope.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let salt: &[u8; SALT_LEN] = salt.try_into().map_err(|_| {
        CipherdeckError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "failed to read salt",
        )
    })?;
    debug!(len = ciphertext.len(), "opening envelope");

    let key = kdf::derive_key(password, salt, params)?;
    let cipher = Aes256Gcm::new((&*key).into());
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            CipherdeckError::user(
                ErrorKind::AuthenticationFailed,
                "corrupt input, tampered-with data, or bad password",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(1000)
    }

    #[test]
    fn test_empty_plaintext() {
        let sealed = seal(b"test", b"", &fast()).unwrap();
        assert_eq!(sealed.len(), MIN_ENVELOPE_LEN + TAG_LEN);
        let opened = open(b"test", &sealed, &fast()).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn test_small_plaintext() {
        let sealed = seal(b"test", b"hello", &fast()).unwrap();
        let opened = open(b"test", &sealed, &fast()).unwrap();
        assert_eq!(b"hello", &opened[..]);
    }

    #[test]
    fn test_text_roundtrip() {
        let envelope = encrypt("attack at dawn", "correct horse battery staple").unwrap();
        assert_eq!(
            decrypt(&envelope, "correct horse battery staple").unwrap(),
            "attack at dawn"
        );
    }

    #[test]
    fn test_case_flipped_password_rejected() {
        let envelope = encrypt("attack at dawn", "correct horse battery staple").unwrap();
        let err = decrypt(&envelope, "Correct horse battery staple")
            .expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_unicode_roundtrip() {
        let text = "päßwörd ✓ 日本語 😀";
        let envelope = encrypt_with(text, "pw", &fast()).unwrap();
        assert_eq!(decrypt_with(&envelope, "pw", &fast()).unwrap(), text);
    }

    #[test]
    fn test_salt_and_nonce_fresh_per_call() {
        let a = seal(b"pw", b"same", &fast()).unwrap();
        let b = seal(b"pw", b"same", &fast()).unwrap();
        assert_ne!(a[..SALT_LEN], b[..SALT_LEN]);
        assert_ne!(a[SALT_LEN..MIN_ENVELOPE_LEN], b[SALT_LEN..MIN_ENVELOPE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic_encryption() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];

        let ct1 = seal_deterministic(b"test", b"hello world", &salt, &nonce, &fast()).unwrap();
        let ct2 = seal_deterministic(b"test", b"hello world", &salt, &nonce, &fast()).unwrap();

        // Same salt/nonce produces identical ciphertext
        assert_eq!(ct1, ct2);
        assert_eq!(b"hello world", &open(b"test", &ct1, &fast()).unwrap()[..]);
    }

    #[test]
    fn test_wrong_password() {
        let sealed = seal(b"correct", b"secret data", &fast()).unwrap();
        let err = open(b"wrong", &sealed, &fast()).expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert!(
            err.to_string()
                .contains("corrupt input, tampered-with data, or bad password")
        );
    }

    #[test]
    fn test_mismatched_iterations_rejected() {
        let sealed = seal(b"pw", b"secret", &KdfParams::new(1000)).unwrap();
        let err = open(b"pw", &sealed, &KdfParams::new(2000)).expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_every_byte_tampered_is_detected() {
        let sealed = seal(b"pw", b"tamper target", &fast()).unwrap();
        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            let err = open(b"pw", &tampered, &fast()).expect_err("tampering went unnoticed");
            assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed), "byte {}", i);
        }
    }

    #[test]
    fn test_truncated_envelope() {
        let err = open(b"pw", &[0u8; MIN_ENVELOPE_LEN - 1], &fast())
            .expect_err("expected truncation failure");
        assert_eq!(err.kind, Some(ErrorKind::Format));
        assert!(err.to_string().contains("input likely truncated"));
    }

    #[test]
    fn test_header_only_envelope_fails_authentication() {
        // Long enough to slice, but no tag to verify.
        let err = open(b"pw", &[0u8; MIN_ENVELOPE_LEN], &fast()).expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_bad_base64_is_format_error() {
        let err = decrypt("%%%", "pw").expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::Format));
    }

    #[test]
    fn test_non_utf8_plaintext_is_format_error() {
        let sealed = seal(b"pw", &[0xff, 0xfe, 0xfd], &fast()).unwrap();
        let err = decrypt_with(&armor::wrap(&sealed), "pw", &fast()).expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::Format));
    }

    #[test]
    fn test_empty_password_rejected() {
        let err = encrypt("text", "").expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::KeyDerivation));
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();
        let sealed = seal(b"test", &plaintext, &fast()).unwrap();
        assert_eq!(plaintext, open(b"test", &sealed, &fast()).unwrap());
    }

    #[test]
    fn test_large_plaintext() {
        let plaintext = vec![0x42u8; 128 * 1024];
        let sealed = seal(b"test", &plaintext, &fast()).unwrap();
        assert_eq!(plaintext, open(b"test", &sealed, &fast()).unwrap());
    }

    #[test]
    fn test_cross_implementation_compatibility() {
        // Produced independently with PBKDF2-HMAC-SHA256 (100000 iterations)
        // and AES-256-GCM from a separate implementation.
        let salt = [0x42u8; SALT_LEN];
        let nonce = [0x24u8; NONCE_LEN];

        let sealed = seal_deterministic(
            b"test",
            b"test payload",
            &salt,
            &nonce,
            &KdfParams::default(),
        )
        .unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42,
            0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42,
            0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24, 0x24,
            0x24, 0x24, 0x24, 0x24,
            0xfe, 0x39, 0xb2, 0xde, 0xfa, 0x67, 0x2b, 0x38,
            0x0e, 0x0e, 0x1e, 0xd1, 0x01, 0xfb, 0x40, 0x97,
            0x9f, 0x72, 0x43, 0xa8, 0xc7, 0x33, 0xed, 0xf7,
            0xfa, 0xb6, 0xdf, 0x5e,
        ];

        assert_eq!(sealed, expected);
        assert_eq!(
            armor::wrap(&sealed),
            "QkJCQkJCQkJCQkJCQkJCQiQkJCQkJCQkJCQkJP45st76Zys4Dg4e0QH7QJefckOoxzPt9/q2314="
        );
        assert_eq!(
            decrypt(&armor::wrap(&sealed), "test").unwrap(),
            "test payload"
        );
    }
}
