//! RSA-OAEP public-key encryption.
//!
//! Keys are exported as DER (SubjectPublicKeyInfo for the public half,
//! PKCS#8 for the private half) and then base64 wrapped, so they travel as
//! plain text. OAEP uses SHA-256 for both the label hash and MGF1.
//!
//! OAEP can only carry a short payload: `modulus_bytes - 2 * 32 - 2` bytes,
//! i.e. 190 bytes for a 2048-bit key and 446 bytes for a 4096-bit key. Use
//! [`crate::hybrid`] for anything longer.
//!
//! Decryption failures are reported as a single [`ErrorKind::DecryptionFailed`]
//! with a fixed message whatever went wrong. That keeps this layer from
//! turning into a padding oracle, but timing is only as uniform as the
//! underlying `rsa` crate makes it; no stronger guarantee is claimed.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::armor;
use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};

/// Bytes of OAEP overhead with SHA-256: two hash lengths plus two.
const OAEP_SHA256_OVERHEAD: usize = 2 * 32 + 2;

/// Supported RSA modulus sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum KeySize {
    Bits2048,
    Bits4096,
}

impl KeySize {
    pub fn bits(self) -> usize {
        match self {
            KeySize::Bits2048 => 2048,
            KeySize::Bits4096 => 4096,
        }
    }
}

impl From<KeySize> for u32 {
    fn from(size: KeySize) -> u32 {
        size.bits() as u32
    }
}

impl TryFrom<u32> for KeySize {
    type Error = CipherdeckError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            2048 => Ok(KeySize::Bits2048),
            4096 => Ok(KeySize::Bits4096),
            other => Err(CipherdeckError::user(
                ErrorKind::UnsupportedAlgorithm,
                format!("unsupported key size {other}; expected 2048 or 4096"),
            )),
        }
    }
}

impl std::fmt::Display for KeySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// A generated key pair in its exported, textual form.
///
/// Serializes to exactly `{ "publicKey", "privateKey", "keySize", "created" }`.
/// The private key is plain text here; keeping it confidential is up to
/// whoever holds this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsymmetricKeyPair {
    pub public_key: String,
    pub private_key: String,
    pub key_size: KeySize,
    pub created: DateTime<Utc>,
}

impl AsymmetricKeyPair {
    /// The key-pair file representation.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CipherdeckError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::KeyEncoding,
                "failed to serialize key pair",
                e,
            )
        })
    }

    /// Parses a key-pair file.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            CipherdeckError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::KeyEncoding,
                "invalid key pair file",
                e,
            )
        })
    }
}

/// Largest plaintext, in bytes, that a key of this size can encrypt.
pub fn max_payload_len(size: KeySize) -> usize {
    size.bits() / 8 - OAEP_SHA256_OVERHEAD
}

/// Generates a new RSA key pair of the given size.
///
/// CPU bound and slow for 4096-bit keys; callers with latency-sensitive
/// threads should run it elsewhere.
pub fn generate_key_pair(size: KeySize) -> Result<AsymmetricKeyPair> {
    info!(bits = size.bits(), "generating RSA key pair");
    let private_key = RsaPrivateKey::new(&mut OsRng, size.bits()).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KeyGeneration,
            "RSA key generation failed",
            e,
        )
    })?;
    let public_key = RsaPublicKey::from(&private_key);

    let public_der = public_key.to_public_key_der().map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KeyEncoding,
            "failed to export public key",
            e,
        )
    })?;
    let private_der = private_key.to_pkcs8_der().map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::KeyEncoding,
            "failed to export private key",
            e,
        )
    })?;

    Ok(AsymmetricKeyPair {
        public_key: armor::wrap(public_der.as_bytes()),
        private_key: armor::wrap(private_der.as_bytes()),
        key_size: size,
        created: Utc::now(),
    })
}

/// Parses a base64 SubjectPublicKeyInfo public key.
pub fn parse_public_key(public_key: &str) -> Result<RsaPublicKey> {
    let der = armor::unwrap(public_key).map_err(|e| e.with_context("invalid public key"))?;
    RsaPublicKey::from_public_key_der(&der).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::KeyEncoding,
            "invalid public key",
            e,
        )
    })
}

/// Parses a base64 PKCS#8 private key.
pub fn parse_private_key(private_key: &str) -> Result<RsaPrivateKey> {
    let der = Zeroizing::new(
        armor::unwrap(private_key).map_err(|e| e.with_context("invalid private key"))?,
    );
    // The parse error is deliberately not attached: it may describe key material.
    RsaPrivateKey::from_pkcs8_der(&der)
        .map_err(|_| CipherdeckError::user(ErrorKind::KeyEncoding, "invalid private key"))
}

/// Encrypts `plaintext` under a base64 public key, returning base64 ciphertext.
///
/// # Errors
///
/// [`ErrorKind::PayloadTooLarge`] if the UTF-8 plaintext is longer than the
/// key's OAEP capacity.
pub fn encrypt(plaintext: &str, public_key: &str) -> Result<String> {
    let key = parse_public_key(public_key)?;
    let capacity = key.size().saturating_sub(OAEP_SHA256_OVERHEAD);
    if plaintext.len() > capacity {
        return Err(CipherdeckError::user(
            ErrorKind::PayloadTooLarge,
            format!(
                "plaintext is {} bytes but a {}-bit key can encrypt at most {}",
                plaintext.len(),
                key.size() * 8,
                capacity
            ),
        ));
    }
    debug!(len = plaintext.len(), bits = key.size() * 8, "RSA-OAEP encrypt");

    let ciphertext = key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext.as_bytes())
        .map_err(|e| {
            CipherdeckError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "RSA-OAEP encryption failed",
                e,
            )
        })?;
    Ok(armor::wrap(&ciphertext))
}

/// Decrypts base64 ciphertext with a base64 private key.
///
/// # Errors
///
/// [`ErrorKind::KeyEncoding`] if the private key cannot be parsed, otherwise
/// [`ErrorKind::DecryptionFailed`] for any failure at all.
pub fn decrypt(ciphertext: &str, private_key: &str) -> Result<String> {
    let key = parse_private_key(private_key)?;
    let failed = || CipherdeckError::user(ErrorKind::DecryptionFailed, "decryption failed");

    let ciphertext = armor::unwrap(ciphertext).map_err(|_| failed())?;
    debug!(len = ciphertext.len(), "RSA-OAEP decrypt");
    let plaintext = key
        .decrypt(Oaep::new::<Sha256>(), &ciphertext)
        .map_err(|_| failed())?;
    String::from_utf8(plaintext).map_err(|_| failed())
}
