use serde::{Deserialize, Serialize};

use super::{
    AuthenticationExtensionsClientInputs, AuthenticationExtensionsClientOutputs,
    AuthenticatorAttachment, PublicKeyCredentialDescriptor, PublicKeyCredentialType,
    UserVerificationRequirement,
};
use crate::Bytes;

/// The options argument of a credential retrieval ceremony.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequestOptions {
    /// The only options member relevant to WebAuthn.
    pub public_key: PublicKeyCredentialRequestOptions,
}

/// Everything a Relying Party supplies to request an assertion.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrequestoptions>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    /// The challenge the assertion signature covers.
    pub challenge: Bytes,

    /// Ceremony timeout hint in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// The Relying Party id the credential must be scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,

    /// Acceptable credentials; empty or absent means any discoverable
    /// credential for the RP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<Vec<PublicKeyCredentialDescriptor>>,

    /// The Relying Party's user verification requirement.
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,

    /// Client extension inputs, notably the PRF extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<AuthenticationExtensionsClientInputs>,
}

/// The credential object returned by a successful retrieval ceremony.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPublicKeyCredential {
    /// Base64url of [`Self::raw_id`].
    pub id: String,

    /// The id of the credential that produced the assertion.
    pub raw_id: Bytes,

    /// Always [`PublicKeyCredentialType::PublicKey`].
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,

    /// The attachment modality actually used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,

    /// The authenticator's assertion response.
    pub response: AuthenticatorAssertionResponse,

    /// Results of the client extension processing, notably PRF.
    pub client_extension_results: AuthenticationExtensionsClientOutputs,
}

/// The authenticator's response to an assertion request.
///
/// <https://w3c.github.io/webauthn/#authenticatorassertionresponse>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponse {
    /// The JSON bytes of the client data the signature covers.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// The authenticator data covered by the signature.
    pub authenticator_data: Bytes,

    /// Signature over `authenticator_data || sha256(client_data_json)`.
    pub signature: Bytes,

    /// The user handle of the asserted credential; this is where the wallet
    /// backend's tenant-scoped handle comes back from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<Bytes>,
}
