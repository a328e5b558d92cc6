//! Cipherdeck - password and public-key cryptography over text
//!
//! Digests, password based AES-256-GCM envelopes, HMAC-SHA256, RSA-OAEP and
//! hybrid encryption, a password strength heuristic, and LSB steganography
//! in RGBA pixel buffers. Binary results travel as standard base64 text.

#![forbid(unsafe_code)]

pub mod algorithm;
pub mod armor;
pub mod asymmetric;
pub mod digest;
pub mod error;
pub mod file_ops;
pub mod hybrid;
pub mod kdf;
pub mod key_store;
pub mod mac;
pub mod passphrase;
pub mod raster;
pub mod secretcrypt;
pub mod stego;
pub mod strength;

pub use error::{CipherdeckError, ErrorCategory, ErrorKind, Result};
