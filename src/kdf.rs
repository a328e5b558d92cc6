//! PBKDF2-HMAC-SHA256 password based key derivation.
//!
//! The iteration count is not recorded in the envelope. Envelopes can only be
//! opened with the same [`KdfParams`] they were sealed with, so changing
//! [`DEFAULT_ITERATIONS`] breaks every envelope produced before the change.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{CipherdeckError, ErrorKind, Result};

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count used unless the caller says otherwise.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Tunable key derivation parameters.
///
/// Only the iteration count is tunable. The PRF is always HMAC-SHA256 and
/// the output is always [`KEY_LEN`] bytes; envelopes carry no algorithm
/// identifier, so a different hash would be a different format.
///
/// Passed explicitly to every operation that derives a key; there is no
/// process-wide setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// PBKDF2 iteration count. Must be at least 1.
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }
}

/// Derive a 32-byte key from a password and salt using PBKDF2-HMAC-SHA256
///
/// Deterministic given identical inputs. The key is wiped from memory when
/// the returned value is dropped.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if password.is_empty() {
        return Err(CipherdeckError::user(
            ErrorKind::KeyDerivation,
            "password must not be empty",
        ));
    }
    if params.iterations == 0 {
        return Err(CipherdeckError::user(
            ErrorKind::KeyDerivation,
            "iteration count must be at least 1",
        ));
    }
    if params.iterations < DEFAULT_ITERATIONS {
        warn!(
            iterations = params.iterations,
            "deriving key with fewer iterations than the default"
        );
    }
    debug!(iterations = params.iterations, "deriving key");

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt, params.iterations, &mut *key);
    Ok(key)
}
