//! Bit-level embedding and extraction.
//!
//! The pixel buffer is interleaved 8-bit RGBA. One payload bit goes into the
//! least significant bit of the first channel (red) of each pixel, i.e.
//! samples `0, 4, 8, ...`; green, blue and alpha are never touched. A
//! trailing partial pixel still contributes its first sample.
//!
//! The bitstream is the UTF-8 bytes of the text, most significant bit first,
//! followed by the 16-bit sentinel `1111111111111110` (bytes `FF FE`). `0xFF`
//! never occurs in UTF-8, so the sentinel cannot be confused with payload.

use tracing::debug;

use crate::error::{CipherdeckError, ErrorKind, Result};

/// Channels per pixel in the buffers this codec works on.
pub const CHANNELS: usize = 4;

/// End-of-payload marker, `1111111111111110`.
pub const SENTINEL: [u8; 2] = [0xFF, 0xFE];

/// Number of samples in a buffer of `len` bytes that can carry a payload bit.
pub fn usable_samples(len: usize) -> usize {
    len.div_ceil(CHANNELS)
}

/// Maximum number of text bytes (UTF-8) a buffer of `len` bytes can hide.
pub fn capacity(len: usize) -> usize {
    (usable_samples(len) / 8).saturating_sub(SENTINEL.len())
}

/// Hides `text` in the low bits of `pixels`, in place.
///
/// Samples past the end of the payload are left untouched.
///
/// # Errors
///
/// [`ErrorKind::CapacityExceeded`] if the buffer is too small for the text
/// plus sentinel. The buffer is not modified in that case.
pub fn embed(pixels: &mut [u8], text: &str) -> Result<()> {
    let needed_bits = (text.len() + SENTINEL.len()) * 8;
    let available = usable_samples(pixels.len());
    if needed_bits > available {
        return Err(CipherdeckError::user(
            ErrorKind::CapacityExceeded,
            format!(
                "payload needs {} pixels but the image has {}; at most {} bytes of text fit",
                needed_bits,
                available,
                capacity(pixels.len())
            ),
        ));
    }
    debug!(bytes = text.len(), bits = needed_bits, available, "embedding payload");

    let bits = text
        .bytes()
        .chain(SENTINEL)
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1));
    for (sample, bit) in pixels.iter_mut().step_by(CHANNELS).zip(bits) {
        *sample = (*sample & 0xFE) | bit;
    }
    Ok(())
}

/// Recovers text hidden by [`embed`].
///
/// Returns an empty string if no sentinel is found, or if the bytes before
/// the first sentinel are not UTF-8; both mean the image carries no payload
/// this codec wrote.
pub fn extract(pixels: &[u8]) -> String {
    let mut bytes = Vec::new();
    let mut current = 0u8;
    let mut filled = 0;

    for sample in pixels.iter().step_by(CHANNELS) {
        current = (current << 1) | (sample & 1);
        filled += 1;
        if filled < 8 {
            continue;
        }
        bytes.push(current);
        current = 0;
        filled = 0;

        if bytes.ends_with(&SENTINEL) {
            bytes.truncate(bytes.len() - SENTINEL.len());
            return match String::from_utf8(bytes) {
                Ok(text) => {
                    debug!(bytes = text.len(), "extracted payload");
                    text
                }
                Err(_) => {
                    debug!("sentinel found after non-UTF-8 data; treating as no payload");
                    String::new()
                }
            };
        }
    }

    debug!("no sentinel found");
    String::new()
}
