//! The authenticatorGetAssertion operation.
//!
//! <https://fidoalliance.org/specs/fido-v2.0-ps-20190130/fido-client-to-authenticator-protocol-v2.0-ps-20190130.html#authenticatorGetAssertion>

use super::{
    AuthenticatorData,
    extensions::{AuthenticatorPrfGetOutputs, AuthenticatorPrfInputs},
    make_credential,
};
use crate::{Bytes, webauthn};

/// A request for an assertion over the client data hash.
#[derive(Debug)]
pub struct Request {
    /// The Relying Party id the asserted credential must be scoped to.
    pub rp_id: String,

    /// Hash of the client data assembled by the ceremony layer.
    pub client_data_hash: Bytes,

    /// Acceptable credentials; empty or absent means any discoverable
    /// credential scoped to `rp_id`.
    pub allow_list: Option<Vec<webauthn::PublicKeyCredentialDescriptor>>,

    /// Processed extension inputs.
    pub extensions: Option<ExtensionInputs>,

    /// Authenticator behavior switches; `rk` is ignored for assertions.
    pub options: make_credential::Options,
}

/// Authenticator extension inputs during an assertion.
#[derive(Debug, Default)]
pub struct ExtensionInputs {
    /// PRF salts to evaluate for the selected credential.
    pub prf: Option<AuthenticatorPrfInputs>,
}

impl ExtensionInputs {
    /// Returns `None` when no extension field is set.
    pub fn zip_contents(self) -> Option<Self> {
        let Self { prf } = &self;
        prf.is_some().then_some(self)
    }
}

/// A successful assertion result.
#[derive(Debug)]
pub struct Response {
    /// The id of the credential that signed.
    pub credential_id: Bytes,

    /// The authenticator data covered by the signature.
    pub auth_data: AuthenticatorData,

    /// Signature over `auth_data || client_data_hash`.
    pub signature: Bytes,

    /// The asserted credential's user handle, for discoverable credentials.
    pub user_handle: Option<Bytes>,

    /// Extension outputs that are not covered by the signature.
    pub unsigned_extension_outputs: Option<UnsignedExtensionOutputs>,
}

/// Unsigned extension outputs of an assertion.
#[derive(Debug, Default)]
pub struct UnsignedExtensionOutputs {
    /// PRF evaluation results.
    pub prf: Option<AuthenticatorPrfGetOutputs>,
}

impl UnsignedExtensionOutputs {
    /// Returns `None` when no extension field is set.
    pub fn zip_contents(self) -> Option<Self> {
        let Self { prf } = &self;
        prf.is_some().then_some(self)
    }
}
