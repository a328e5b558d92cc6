//! One-way digests over text.
//!
//! [`sha`] is the real thing: SHA-256 or SHA-512 over the UTF-8 bytes of the
//! input, hex encoded.
//!
//! [`legacy_checksum`] is NOT a cryptographic digest. It reproduces the
//! 32-bit rolling string hash that older stored artifacts were tagged with
//! (and that earlier tooling displayed under the name "MD5", which it never
//! was). It has no collision resistance, is trivially forgeable and must not
//! be used for integrity or any other security purpose. Use [`sha`] or
//! [`crate::mac::hmac`] for that.

use sha2::{Digest, Sha256, Sha512};
use tracing::debug;

/// Output size tier for [`sha`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestStrength {
    /// SHA-256, 32-byte digest.
    #[default]
    Sha256,
    /// SHA-512, 64-byte digest.
    Sha512,
}

impl DigestStrength {
    /// Digest length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestStrength::Sha256 => 32,
            DigestStrength::Sha512 => 64,
        }
    }
}

/// Hex-encoded SHA-2 digest of `text` at the given strength.
///
/// Deterministic; identical inputs always produce identical outputs.
pub fn sha(text: &str, strength: DigestStrength) -> String {
    debug!(len = text.len(), ?strength, "computing digest");
    match strength {
        DigestStrength::Sha256 => hex::encode(Sha256::digest(text.as_bytes())),
        DigestStrength::Sha512 => hex::encode(Sha512::digest(text.as_bytes())),
    }
}

/// Fast, non-cryptographic 32-bit checksum of `text`, as 8 lowercase hex digits.
///
/// `h = h * 31 + unit` over the UTF-16 code units of the text with 32-bit
/// signed wrap-around, rendered as the magnitude of the final value. The
/// result is order sensitive but nothing more: collisions are easy to find
/// (`"Aa"` and `"BB"` collide) and a hash value and its negation render the
/// same.
pub fn legacy_checksum(text: &str) -> String {
    let hash = text
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    format!("{:08x}", hash.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// FIPS 180-2 SHA-256 test vector: "abc".
    #[test]
    fn test_sha256_abc() {
        assert_eq!(
            sha("abc", DigestStrength::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha("", DigestStrength::Sha256),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    /// FIPS 180-2 SHA-512 test vector: "abc".
    #[test]
    fn test_sha512_abc() {
        assert_eq!(
            sha("abc", DigestStrength::Sha512),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_output_lengths() {
        for strength in [DigestStrength::Sha256, DigestStrength::Sha512] {
            assert_eq!(sha("x", strength).len(), strength.output_len() * 2);
        }
    }

    #[test]
    fn test_checksum_known_values() {
        assert_eq!(legacy_checksum(""), "00000000");
        assert_eq!(legacy_checksum("a"), "00000061");
        assert_eq!(legacy_checksum("hello"), "05e918d2");
        assert_eq!(legacy_checksum("hello world"), "6aefe2c4");
        assert_eq!(legacy_checksum("Hello World"), "3369657c");
    }

    #[test]
    fn test_checksum_uses_utf16_units() {
        assert_eq!(legacy_checksum("€"), "000020ac");
        // Surrogate pair, two code units.
        assert_eq!(legacy_checksum("😀"), "001b0d63");
    }

    #[test]
    fn test_checksum_order_sensitive() {
        assert_eq!(legacy_checksum("ab"), "00000c21");
        assert_eq!(legacy_checksum("ba"), "00000c3f");
    }

    #[test]
    fn test_checksum_is_not_collision_resistant() {
        assert_eq!(legacy_checksum("Aa"), legacy_checksum("BB"));
    }
}
