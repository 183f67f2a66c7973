//! Byte-string encoding used on every binary field that crosses an HTTP or
//! channel boundary in this workspace.

use std::fmt;

use data_encoding::{BASE64, BASE64URL, BASE64URL_NOPAD, BASE64_NOPAD, Specification};

/// The given string is not valid base64url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    input_len: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input of {} characters is not valid base64url",
            self.input_len
        )
    }
}

impl std::error::Error for DecodeError {}

/// Convert bytes to base64url without padding.
pub fn base64url(data: &[u8]) -> String {
    BASE64URL_NOPAD.encode(data)
}

/// Convert bytes to base64 without padding.
pub fn base64(data: &[u8]) -> String {
    BASE64_NOPAD.encode(data)
}

/// Decode an unpadded (or padded) base64url string.
///
/// Malformed input is an error, never a truncated result.
pub fn from_base64url(input: &str) -> Result<Vec<u8>, DecodeError> {
    let specs = BASE64URL.specification();
    // SAFETY: the base64url specification always carries a padding character.
    let padding = specs.padding.unwrap();
    let specs = Specification {
        check_trailing_bits: false,
        padding: None,
        ..specs
    };
    // SAFETY: the specification is derived from a valid built-in encoding.
    let encoding = specs.encoding().unwrap();
    encoding
        .decode(input.trim_end_matches(padding).as_bytes())
        .map_err(|_| DecodeError {
            input_len: input.len(),
        })
}

/// Try parsing from base64 with or without padding.
pub(crate) fn try_from_base64(input: &str) -> Option<Vec<u8>> {
    // SAFETY: the base64 specification always carries a padding character.
    let padding = BASE64.specification().padding.unwrap();
    BASE64_NOPAD
        .decode(input.trim_end_matches(padding).as_bytes())
        .ok()
}
