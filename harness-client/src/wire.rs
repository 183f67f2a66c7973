//! The wallet backend's JSON wire shapes.
//!
//! Every binary field crossing the HTTP boundary is wrapped in the tagged
//! object `{"$b64u": "..."}` ([`TaggedBytes`]); the structures here are the
//! wire-side mirrors of the WebAuthn dictionaries plus the conversions
//! between the two.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use harness_types::{
    TaggedBytes,
    webauthn::{
        AttestationConveyancePreference, AuthenticatedPublicKeyCredential,
        AuthenticationExtensionsClientOutputs, AuthenticatorSelectionCriteria,
        AuthenticatorTransport, CreatedPublicKeyCredential, CredentialCreationOptions,
        CredentialRequestOptions, PublicKeyCredentialCreationOptions, PublicKeyCredentialDescriptor,
        PublicKeyCredentialParameters, PublicKeyCredentialRequestOptions,
        PublicKeyCredentialRpEntity, PublicKeyCredentialType, PublicKeyCredentialUserEntity,
        UserVerificationRequirement,
    },
};

/// Body of `POST /user/register-webauthn-begin`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBeginRequest {
    /// The account name to register.
    pub name: String,
}

/// Response of `POST /user/register-webauthn-begin`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBeginResponse {
    /// Creation options in wire form.
    pub public_key: WireCreationOptions,
}

/// Creation options with tagged binary fields.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCreationOptions {
    /// The Relying Party.
    pub rp: PublicKeyCredentialRpEntity,

    /// The user entity; the `id` carries the tenant-scoped user handle.
    pub user: WireUserEntity,

    /// The registration challenge.
    pub challenge: TaggedBytes,

    /// Acceptable algorithms.
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,

    /// Ceremony timeout hint in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// Credentials that must not be re-registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_credentials: Option<Vec<WireDescriptor>>,

    /// Authenticator requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,

    /// Attestation preference.
    #[serde(default)]
    pub attestation: AttestationConveyancePreference,
}

/// A user entity in wire form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUserEntity {
    /// The (tenant-scoped) user handle.
    pub id: TaggedBytes,
    /// Account name.
    pub name: String,
    /// Name intended for display.
    pub display_name: String,
}

/// A credential descriptor in wire form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDescriptor {
    /// The credential type.
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,
    /// The credential id.
    pub id: TaggedBytes,
    /// Transport hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}

impl From<WireDescriptor> for PublicKeyCredentialDescriptor {
    fn from(wire: WireDescriptor) -> Self {
        Self {
            ty: wire.ty,
            id: wire.id.into(),
            transports: wire.transports,
        }
    }
}

impl From<RegisterBeginResponse> for CredentialCreationOptions {
    fn from(wire: RegisterBeginResponse) -> Self {
        let options = wire.public_key;
        Self {
            public_key: PublicKeyCredentialCreationOptions {
                rp: options.rp,
                user: PublicKeyCredentialUserEntity {
                    id: options.user.id.into(),
                    name: options.user.name,
                    display_name: options.user.display_name,
                },
                challenge: options.challenge.into(),
                pub_key_cred_params: options.pub_key_cred_params,
                timeout: options.timeout,
                exclude_credentials: options
                    .exclude_credentials
                    .map(|list| list.into_iter().map(Into::into).collect()),
                authenticator_selection: options.authenticator_selection,
                attestation: options.attestation,
                extensions: None,
            },
        }
    }
}

/// Response of `POST /user/login-webauthn-begin`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBeginResponse {
    /// Request options in wire form.
    pub public_key: WireRequestOptions,
}

/// Request options with tagged binary fields.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequestOptions {
    /// The login challenge.
    pub challenge: TaggedBytes,

    /// Ceremony timeout hint in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    /// The RP ID to assert under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,

    /// Acceptable credentials; empty means any discoverable credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<Vec<WireDescriptor>>,

    /// User verification requirement.
    #[serde(default)]
    pub user_verification: UserVerificationRequirement,
}

impl From<LoginBeginResponse> for CredentialRequestOptions {
    fn from(wire: LoginBeginResponse) -> Self {
        let options = wire.public_key;
        Self {
            public_key: PublicKeyCredentialRequestOptions {
                challenge: options.challenge.into(),
                timeout: options.timeout,
                rp_id: options.rp_id,
                allow_credentials: options
                    .allow_credentials
                    .map(|list| list.into_iter().map(Into::into).collect()),
                user_verification: options.user_verification,
                extensions: None,
            },
        }
    }
}

/// Body of `POST /user/register-webauthn-finish`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFinishRequest {
    /// Base64url of the credential id.
    pub id: String,
    /// The raw credential id.
    pub raw_id: TaggedBytes,
    /// The credential type.
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,
    /// The attestation response.
    pub response: WireAttestationResponse,
    /// Client extension outputs, PRF included.
    pub client_extension_results: AuthenticationExtensionsClientOutputs,
}

/// The attestation half of a registration finish.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAttestationResponse {
    /// The client data JSON bytes.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: TaggedBytes,
    /// The CBOR attestation object.
    pub attestation_object: TaggedBytes,
    /// Transports of the creating authenticator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}

impl From<CreatedPublicKeyCredential> for RegisterFinishRequest {
    fn from(credential: CreatedPublicKeyCredential) -> Self {
        Self {
            id: credential.id,
            raw_id: credential.raw_id.into(),
            ty: credential.ty,
            response: WireAttestationResponse {
                client_data_json: credential.response.client_data_json.into(),
                attestation_object: credential.response.attestation_object.into(),
                transports: credential.response.transports,
            },
            client_extension_results: credential.client_extension_results,
        }
    }
}

/// Body of `POST /user/login-webauthn-finish`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFinishRequest {
    /// Base64url of the credential id.
    pub id: String,
    /// The raw credential id.
    pub raw_id: TaggedBytes,
    /// The credential type.
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,
    /// The assertion response.
    pub response: WireAssertionResponse,
    /// Client extension outputs, PRF included.
    pub client_extension_results: AuthenticationExtensionsClientOutputs,
}

/// The assertion half of a login finish.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAssertionResponse {
    /// The client data JSON bytes.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: TaggedBytes,
    /// The signed authenticator data.
    pub authenticator_data: TaggedBytes,
    /// The assertion signature.
    pub signature: TaggedBytes,
    /// The asserted credential's (tenant-scoped) user handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<TaggedBytes>,
}

impl From<AuthenticatedPublicKeyCredential> for LoginFinishRequest {
    fn from(credential: AuthenticatedPublicKeyCredential) -> Self {
        Self {
            id: credential.id,
            raw_id: credential.raw_id.into(),
            ty: credential.ty,
            response: WireAssertionResponse {
                client_data_json: credential.response.client_data_json.into(),
                authenticator_data: credential.response.authenticator_data.into(),
                signature: credential.response.signature.into(),
                user_handle: credential.response.user_handle.map(Into::into),
            },
            client_extension_results: credential.client_extension_results,
        }
    }
}

/// Success body of both finish endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    /// The user's id in the backend.
    pub uuid: Uuid,
    /// The tenant the user belongs to, for tenant-scoped flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// The 409 body signalling a cross-tenant login.
///
/// This is data, not an error: scenarios assert on `redirect_tenant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRedirect {
    /// Always `"Tenant redirect required"`.
    pub error: String,
    /// The tenant the user must log in under.
    pub redirect_tenant: String,
    /// The user's id in that tenant.
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_request_uses_tagged_binary_fields() {
        let request = RegisterFinishRequest {
            id: "AAEC".into(),
            raw_id: vec![0, 1, 2].into(),
            ty: PublicKeyCredentialType::PublicKey,
            response: WireAttestationResponse {
                client_data_json: b"{}".as_slice().into(),
                attestation_object: vec![0xA0].into(),
                transports: Some(vec![AuthenticatorTransport::Internal]),
            },
            client_extension_results: Default::default(),
        };
        let json = serde_json::to_value(&request).expect("serializable");

        assert_eq!(json["rawId"]["$b64u"], "AAEC");
        assert_eq!(json["response"]["clientDataJSON"]["$b64u"], "e30");
        assert_eq!(json["type"], "public-key");
        assert_eq!(json["response"]["transports"][0], "internal");
    }

    #[test]
    fn begin_response_converts_to_creation_options() {
        let json = serde_json::json!({
            "publicKey": {
                "rp": { "id": "wallet.keyfold.dev", "name": "Keyfold Wallet" },
                "user": {
                    "id": { "$b64u": "YWNtZS1jb3JwOjEyMzQ" },
                    "name": "maya@example.com",
                    "displayName": "Maya"
                },
                "challenge": { "$b64u": "AAECAwQFBgc" },
                "pubKeyCredParams": [ { "type": "public-key", "alg": -7 } ]
            }
        });
        let begin: RegisterBeginResponse =
            serde_json::from_value(json).expect("wire shape parses");
        let options = CredentialCreationOptions::from(begin);
        assert_eq!(
            options.public_key.challenge.as_slice(),
            &[0, 1, 2, 3, 4, 5, 6, 7]
        );
        assert_eq!(
            options.public_key.user.id.as_slice(),
            b"acme-corp:1234".as_slice()
        );
    }

    #[test]
    fn tenant_redirect_round_trips() {
        let body = r#"{
            "error": "Tenant redirect required",
            "redirect_tenant": "tenant-a",
            "user_id": "123e4567-e89b-12d3-a456-426614174000"
        }"#;
        let redirect: TenantRedirect = serde_json::from_str(body).expect("parses");
        assert_eq!(redirect.redirect_tenant, "tenant-a");
    }
}
