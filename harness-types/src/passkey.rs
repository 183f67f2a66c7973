use coset::CoseKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::Bytes;

/// A WebAuthn credential as stored by the software authenticator.
///
/// The private key never leaves the authenticator; tests observe credentials
/// through the automation channel which only exposes their public attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Passkey {
    /// The COSE encoded private key.
    pub key: CoseKey,

    /// The id of this credential, chosen by the authenticator at creation.
    pub credential_id: Bytes,

    /// The Relying Party id this credential is scoped to.
    pub rp_id: String,

    /// The user handle given at creation. `None` for non-discoverable
    /// credentials.
    pub user_handle: Option<Bytes>,

    /// The signature counter. `None` when the authenticator was configured
    /// without counters.
    pub counter: Option<u32>,

    /// Per-credential extension state.
    pub extensions: CredentialExtensions,
}

/// Extension data carried by a [`Passkey`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CredentialExtensions {
    /// State of the hmac-secret extension, backing the WebAuthn PRF
    /// extension on PRF-capable authenticators.
    pub hmac_secret: Option<StoredHmacSecret>,
}

/// The per-credential secrets of the hmac-secret extension.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct StoredHmacSecret {
    /// Secret used when the assertion was made with user verification.
    pub cred_with_uv: Vec<u8>,

    /// Secret used without user verification, when the authenticator was
    /// configured to support that mode.
    pub cred_without_uv: Option<Vec<u8>>,
}

impl std::fmt::Debug for StoredHmacSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredHmacSecret").finish_non_exhaustive()
    }
}
