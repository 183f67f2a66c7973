//! The authenticatorMakeCredential operation.
//!
//! <https://fidoalliance.org/specs/fido-v2.0-ps-20190130/fido-client-to-authenticator-protocol-v2.0-ps-20190130.html#authenticatorMakeCredential>

use super::{
    AuthenticatorData,
    extensions::{AuthenticatorPrfInputs, AuthenticatorPrfMakeOutputs},
};
use crate::{Bytes, webauthn};

/// A request to create a new credential.
#[derive(Debug)]
pub struct Request {
    /// Hash of the client data assembled by the ceremony layer.
    pub client_data_hash: Bytes,

    /// The Relying Party the credential will be scoped to. Unlike the
    /// WebAuthn dictionary the id is mandatory here; the ceremony layer has
    /// already defaulted it from the origin.
    pub rp: PublicKeyCredentialRpEntity,

    /// The user account, including the backend's tenant-scoped handle.
    pub user: webauthn::PublicKeyCredentialUserEntity,

    /// Acceptable algorithms, most preferred first.
    pub pub_key_cred_params: Vec<webauthn::PublicKeyCredentialParameters>,

    /// Credentials that must not be re-registered on this authenticator.
    pub exclude_list: Option<Vec<webauthn::PublicKeyCredentialDescriptor>>,

    /// Processed extension inputs.
    pub extensions: Option<ExtensionInputs>,

    /// Authenticator behavior switches.
    pub options: Options,
}

/// The rk/up/uv switches of a creation request.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Store the credential as a discoverable (resident) credential.
    pub rk: bool,
    /// Require a user presence gesture.
    pub up: bool,
    /// Require user verification.
    pub uv: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rk: false,
            up: true,
            uv: false,
        }
    }
}

/// Authenticator extension inputs during credential creation.
#[derive(Debug, Default)]
pub struct ExtensionInputs {
    /// Request to provision hmac-secret material for the new credential.
    pub hmac_secret: Option<bool>,

    /// PRF salts to evaluate at creation time.
    pub prf: Option<AuthenticatorPrfInputs>,
}

impl ExtensionInputs {
    /// Returns `None` when no extension field is set.
    pub fn zip_contents(self) -> Option<Self> {
        let Self { hmac_secret, prf } = &self;
        (hmac_secret.is_some() || prf.is_some()).then_some(self)
    }
}

/// A successful creation result.
#[derive(Debug)]
pub struct Response {
    /// Authenticator data carrying the attested credential data.
    pub auth_data: AuthenticatorData,

    /// Extension outputs that are not covered by the attestation signature.
    pub unsigned_extension_outputs: Option<UnsignedExtensionOutputs>,
}

/// Unsigned extension outputs of a creation.
#[derive(Debug, Default)]
pub struct UnsignedExtensionOutputs {
    /// PRF enablement (and optionally evaluation) results.
    pub prf: Option<AuthenticatorPrfMakeOutputs>,
}

impl UnsignedExtensionOutputs {
    /// Returns `None` when no extension field is set.
    pub fn zip_contents(self) -> Option<Self> {
        let Self { prf } = &self;
        prf.is_some().then_some(self)
    }
}

/// The CTAP2 flavor of the RP entity, with a mandatory id.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKeyCredentialRpEntity {
    /// The RP id the credential is scoped to.
    pub id: String,
    /// Human friendly Relying Party name.
    pub name: Option<String>,
}
