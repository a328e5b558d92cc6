//! Algorithm selection by identifier.
//!
//! Front ends refer to algorithms by short string names. Each name parses
//! into one variant, and each variant dispatches to exactly one component;
//! nothing is looked up dynamically after parsing.

use std::fmt;
use std::str::FromStr;

use crate::digest::{self, DigestStrength};
use crate::error::{CipherdeckError, ErrorKind, Result};
use crate::{asymmetric, mac, secretcrypt};

/// Digest family: unkeyed hashes, the keyed MAC and the legacy checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
    HmacSha256,
    /// Non-cryptographic; see [`digest::legacy_checksum`].
    LegacyChecksum,
}

impl DigestAlgorithm {
    pub const ALL: [DigestAlgorithm; 4] = [
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::HmacSha256,
        DigestAlgorithm::LegacyChecksum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha-256",
            DigestAlgorithm::Sha512 => "sha-512",
            DigestAlgorithm::HmacSha256 => "hmac-sha256",
            DigestAlgorithm::LegacyChecksum => "checksum",
        }
    }

    pub fn is_keyed(self) -> bool {
        matches!(self, DigestAlgorithm::HmacSha256)
    }

    /// False only for the legacy checksum.
    pub fn is_cryptographic(self) -> bool {
        !matches!(self, DigestAlgorithm::LegacyChecksum)
    }

    /// Hex digest of `text`. `secret` is required by keyed algorithms and
    /// ignored by the others.
    pub fn compute(self, text: &str, secret: Option<&str>) -> Result<String> {
        match self {
            DigestAlgorithm::Sha256 => Ok(digest::sha(text, DigestStrength::Sha256)),
            DigestAlgorithm::Sha512 => Ok(digest::sha(text, DigestStrength::Sha512)),
            DigestAlgorithm::HmacSha256 => mac::hmac(text, secret.unwrap_or_default()),
            DigestAlgorithm::LegacyChecksum => Ok(digest::legacy_checksum(text)),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CipherdeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha-256" | "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha-512" | "sha512" => Ok(DigestAlgorithm::Sha512),
            "hmac-sha256" | "hmac" => Ok(DigestAlgorithm::HmacSha256),
            "checksum" | "legacy-checksum" => Ok(DigestAlgorithm::LegacyChecksum),
            _ => Err(unsupported(s)),
        }
    }
}

/// Single-key cipher family. The key is a password for [`CipherAlgorithm::Aes256Gcm`]
/// and a public (encrypt) or private (decrypt) key for [`CipherAlgorithm::RsaOaep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgorithm {
    Aes256Gcm,
    RsaOaep,
}

impl CipherAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            CipherAlgorithm::Aes256Gcm => "aes-gcm",
            CipherAlgorithm::RsaOaep => "rsa-oaep",
        }
    }

    pub fn encrypt(self, plaintext: &str, key: &str) -> Result<String> {
        match self {
            CipherAlgorithm::Aes256Gcm => secretcrypt::encrypt(plaintext, key),
            CipherAlgorithm::RsaOaep => asymmetric::encrypt(plaintext, key),
        }
    }

    pub fn decrypt(self, ciphertext: &str, key: &str) -> Result<String> {
        match self {
            CipherAlgorithm::Aes256Gcm => secretcrypt::decrypt(ciphertext, key),
            CipherAlgorithm::RsaOaep => asymmetric::decrypt(ciphertext, key),
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CipherdeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aes-gcm" | "aes-256-gcm" | "aes" => Ok(CipherAlgorithm::Aes256Gcm),
            "rsa-oaep" | "rsa" => Ok(CipherAlgorithm::RsaOaep),
            _ => Err(unsupported(s)),
        }
    }
}

fn unsupported(name: &str) -> CipherdeckError {
    CipherdeckError::user(
        ErrorKind::UnsupportedAlgorithm,
        format!("unsupported algorithm '{name}'"),
    )
}
