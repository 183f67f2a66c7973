use serde::{Deserialize, Serialize};

/// An Authenticator Attestation GUID: a 128-bit identifier for the make and
/// model of an authenticator.
///
/// The virtual authenticators in this harness use the all-zero AAGUID, the
/// conventional value for self or no attestation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aaguid(pub [u8; Self::LEN]);

impl Aaguid {
    const LEN: usize = 16;

    /// The all-zero AAGUID.
    pub const fn new_empty() -> Self {
        Self([0; Self::LEN])
    }
}

impl Default for Aaguid {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl From<[u8; 16]> for Aaguid {
    fn from(inner: [u8; 16]) -> Self {
        Aaguid(inner)
    }
}
