use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    AuthenticationExtensionsClientInputs, AuthenticationExtensionsClientOutputs,
    AuthenticatorAttachment, AuthenticatorTransport, PublicKeyCredentialDescriptor,
    PublicKeyCredentialType, UserVerificationRequirement, common::algorithm,
};
use crate::Bytes;

/// The options argument of a credential creation ceremony.
///
/// <https://w3c.github.io/webauthn/#dictionary-credentialcreationoptions-extension>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCreationOptions {
    /// The only options member relevant to WebAuthn.
    pub public_key: PublicKeyCredentialCreationOptions,
}

/// Everything a Relying Party supplies to create a credential.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialcreationoptions>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    /// The Relying Party the credential will be scoped to.
    pub rp: PublicKeyCredentialRpEntity,

    /// The user account the credential will be bound to. The `id` carries
    /// the backend's (possibly tenant-scoped) user handle.
    pub user: PublicKeyCredentialUserEntity,

    /// The challenge the authenticator signs over.
    pub challenge: Bytes,

    /// Signature algorithms the Relying Party accepts, most preferred first.
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,

    /// Ceremony timeout hint in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// Credentials that must not be re-registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_credentials: Option<Vec<PublicKeyCredentialDescriptor>>,

    /// Requirements on the authenticator performing the creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,

    /// The Relying Party's attestation preference.
    #[serde(default)]
    pub attestation: AttestationConveyancePreference,

    /// Client extension inputs, notably the PRF extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<AuthenticationExtensionsClientInputs>,
}

/// The Relying Party a credential is created for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKeyCredentialRpEntity {
    /// The RP id; defaults to the caller origin's effective domain when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human friendly name of the Relying Party.
    pub name: String,
}

/// The user account a credential is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialUserEntity {
    /// The user handle; the wallet backend packs its tenant scoping in here.
    pub id: Bytes,

    /// Account name, e.g. an email address.
    pub name: String,

    /// Name intended for display.
    pub display_name: String,
}

/// A credential type / signature algorithm pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PublicKeyCredentialParameters {
    /// The credential type.
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,

    /// The COSE identifier of the signature algorithm.
    #[serde(with = "algorithm")]
    pub alg: coset::iana::Algorithm,
}

impl PublicKeyCredentialParameters {
    /// ES256, the only algorithm the software authenticator signs with.
    pub fn es256() -> Vec<Self> {
        vec![Self {
            ty: PublicKeyCredentialType::PublicKey,
            alg: coset::iana::Algorithm::ES256,
        }]
    }
}

/// Filters on which authenticators may service a creation request.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticatorselectioncriteria>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    /// Restrict to platform or cross-platform authenticators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,

    /// Whether the credential must be discoverable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_key: Option<ResidentKeyRequirement>,

    /// WebAuthn Level 1 spelling of `resident_key: required`.
    #[serde(default)]
    pub require_resident_key: bool,

    /// The Relying Party's user verification requirement.
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
}

/// Discoverable-credential requirement values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    /// A server-side credential is acceptable.
    Discouraged,
    /// Prefer a discoverable credential.
    Preferred,
    /// The ceremony must fail if a discoverable credential cannot be created.
    Required,
}

/// Attestation conveyance values; the wallet only ever asks for `none`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    /// No attestation statement requested.
    #[default]
    None,
    /// Attestation via an anonymization CA is acceptable.
    Indirect,
    /// The Relying Party wants the authenticator's own statement.
    Direct,
}

/// The credential object returned by a successful creation ceremony.
///
/// <https://w3c.github.io/webauthn/#publickeycredential>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPublicKeyCredential {
    /// Base64url of [`Self::raw_id`].
    pub id: String,

    /// The credential id chosen by the authenticator.
    pub raw_id: Bytes,

    /// Always [`PublicKeyCredentialType::PublicKey`].
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,

    /// The attachment modality actually used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,

    /// The authenticator's attestation response.
    pub response: AuthenticatorAttestationResponse,

    /// Results of the client extension processing, notably PRF.
    pub client_extension_results: AuthenticationExtensionsClientOutputs,
}

/// The authenticator's response to a creation request.
///
/// <https://w3c.github.io/webauthn/#authenticatorattestationresponse>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponse {
    /// The JSON bytes of the client data the signature covers.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// The authenticator data, extracted for the easy accessors.
    pub authenticator_data: Bytes,

    /// DER encoded public key, when the algorithm is supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Bytes>,

    /// COSE identifier of the new credential's algorithm.
    pub public_key_algorithm: i64,

    /// The CBOR attestation object.
    pub attestation_object: Bytes,

    /// Transports the authenticator believes it is reachable over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}

/// The client data assembled by the ceremony layer and hashed into every
/// signature.
///
/// <https://w3c.github.io/webauthn/#dictdef-collectedclientdata>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedClientData {
    /// Whether this ceremony was a creation or a retrieval.
    #[serde(rename = "type")]
    pub ty: ClientDataType,

    /// Base64url of the Relying Party's challenge.
    pub challenge: String,

    /// The fully qualified origin the ceremony ran on.
    pub origin: String,

    /// Set when the ceremony ran inside a cross-origin iframe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<bool>,

    /// Pass-through for keys this client does not know about; backends must
    /// tolerate them and so must we when replaying captured payloads.
    #[serde(flatten)]
    pub unknown_keys: IndexMap<String, serde_json::Value>,
}

/// The `type` discriminant of [`CollectedClientData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientDataType {
    /// A creation ceremony.
    #[serde(rename = "webauthn.create")]
    Create,
    /// A retrieval ceremony.
    #[serde(rename = "webauthn.get")]
    Get,
}
