//! Cryptographic primitives shared by the codec, the PRF engine and the
//! authenticator extensions.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

/// Compute the SHA-256 of the given `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    // SAFETY: sha256 always gives a 32 byte array
    Sha256::digest(data).into()
}

/// Compute HMAC-SHA256 over `data` with the given `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    // SAFETY: HMAC accepts keys of any length.
    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
    mac.update(data);
    mac.finalize().into_bytes().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_differs_per_key_and_message() {
        let a = hmac_sha256(b"key-a", b"message");
        let b = hmac_sha256(b"key-b", b"message");
        let c = hmac_sha256(b"key-a", b"other message");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, hmac_sha256(b"key-a", b"message"));
    }
}
