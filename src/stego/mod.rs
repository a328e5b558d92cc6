//! Least-significant-bit steganography in RGBA pixel buffers.
//!
//! - [`codec`] is the bit-level format: which samples carry which bits, and
//!   how the end of the payload is marked. It knows nothing about passwords.
//! - [`lock`] optionally binds a password to the hidden text before it goes
//!   through the codec, and checks it on the way out.
//!
//! Neither module touches files; see [`crate::raster`] for getting pixels
//! out of and back into PNG images. Lossy formats destroy the payload.

pub mod codec;
pub mod lock;

pub use codec::{capacity, embed, extract};
pub use lock::{embed_locked, extract_locked};
