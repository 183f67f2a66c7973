//! The authenticatorGetInfo operation.

use super::Aaguid;
use crate::webauthn;

/// What an authenticator reports about itself; the ceremony layer gates
/// extension processing on this.
#[derive(Debug, Clone)]
pub struct Response {
    /// Supported protocol versions.
    pub versions: Vec<Version>,

    /// Supported extensions, if any.
    pub extensions: Option<Vec<Extension>>,

    /// The authenticator's AAGUID.
    pub aaguid: Aaguid,

    /// Option support map.
    pub options: Options,

    /// Transports the authenticator is reachable over.
    pub transports: Option<Vec<webauthn::AuthenticatorTransport>>,
}

/// The option support map of a get-info response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Supports discoverable (resident) credentials.
    pub rk: bool,

    /// Supports user presence gestures.
    pub up: bool,

    /// User verification support: `None` means not capable, `Some(enabled)`
    /// reports the currently configured state.
    pub uv: Option<bool>,
}

/// Protocol versions an authenticator can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// CTAP 2.0.
    Fido2_0,
    /// CTAP 2.1.
    Fido2_1,
    /// The legacy U2F protocol.
    U2fV2,
}

/// Extensions an authenticator can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// The CTAP2 hmac-secret extension.
    HmacSecret,
    /// The WebAuthn PRF extension, evaluated authenticator-side.
    Prf,
}
