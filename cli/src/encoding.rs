//! URL-safe base64 decoding for push key material.
//!
//! Push services hand out the VAPID application server key as URL-safe
//! base64 without padding, while the Push API wants the raw key bytes.
//! [`url_base64_to_bytes`] bridges the two by restoring padding, mapping
//! the URL-safe alphabet back onto the standard one, and running a standard
//! base64 decode.
//!
//! The decode is lenient about trailing bits in the final symbol, matching
//! what browsers' `atob` accepts, so keys that were truncated by hand (for
//! example `"FPQxkY"`) still decode the same way they do in the page.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use thiserror::Error;

/// Standard-alphabet engine with `atob` semantics: canonical padding,
/// non-zero trailing bits allowed.
const ATOB: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Failure to decode a URL-safe base64 string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input (after padding and translation) is not valid base64.
    #[error("invalid base64url input: {0}")]
    Invalid(#[from] base64::DecodeError),
}

/// Number of `=` characters needed to bring `len` up to a multiple of four.
///
/// A length of `1 mod 4` yields 3, which no valid base64 string can use;
/// the decode step rejects it.
pub fn padding_len(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Restore padding and translate `-`/`_` to `+`/`/`.
pub fn to_standard_base64(input: &str) -> String {
    let pad = padding_len(input.len());
    let mut out = String::with_capacity(input.len() + pad);
    out.extend(input.chars().map(|c| match c {
        '-' => '+',
        '_' => '/',
        other => other,
    }));
    out.extend(std::iter::repeat('=').take(pad));
    out
}

/// Decode a URL-safe, unpadded base64 string into raw bytes.
///
/// Empty input yields an empty vector; deciding whether that is acceptable
/// is the caller's job.
pub fn url_base64_to_bytes(input: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(ATOB.decode(to_standard_base64(input))?)
}
