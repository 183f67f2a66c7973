//! Shared fixtures for this crate's unit tests: a scriptable provider and
//! minimal ceremony options.

use async_trait::async_trait;
use harness_types::webauthn::{
    AuthenticatedPublicKeyCredential, AuthenticationExtensionsClientInputs,
    AuthenticationExtensionsClientOutputs, AuthenticationExtensionsPrfInputs,
    AuthenticatorAssertionResponse, AuthenticatorAttestationResponse, CreatedPublicKeyCredential,
    CredentialCreationOptions, CredentialRequestOptions, PublicKeyCredentialCreationOptions,
    PublicKeyCredentialParameters, PublicKeyCredentialRequestOptions, PublicKeyCredentialRpEntity,
    PublicKeyCredentialType, PublicKeyCredentialUserEntity, UserVerificationRequirement,
};
use url::Url;

use crate::{CeremonyProvider, WebauthnError};

/// The fixed credential id every stub ceremony resolves with.
pub(crate) const STUB_CREDENTIAL_ID: [u8; 16] = [9; 16];

/// A provider that resolves instantly, with no extension processing of its
/// own, exactly the shape of a virtual authenticator that advertises PRF
/// but never computes it.
pub(crate) struct StubProvider {
    fail: bool,
}

impl StubProvider {
    pub fn succeeding() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl CeremonyProvider for StubProvider {
    async fn create(
        &self,
        _origin: &Url,
        _options: CredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, WebauthnError> {
        if self.fail {
            return Err(WebauthnError::CredentialNotFound);
        }
        Ok(CreatedPublicKeyCredential {
            id: harness_types::encoding::base64url(&STUB_CREDENTIAL_ID),
            raw_id: STUB_CREDENTIAL_ID.into(),
            ty: PublicKeyCredentialType::PublicKey,
            authenticator_attachment: None,
            response: AuthenticatorAttestationResponse {
                client_data_json: b"{}".as_slice().into(),
                authenticator_data: vec![0; 37].into(),
                public_key: None,
                public_key_algorithm: -7,
                attestation_object: vec![0; 8].into(),
                transports: None,
            },
            client_extension_results: AuthenticationExtensionsClientOutputs::default(),
        })
    }

    async fn get(
        &self,
        _origin: &Url,
        _options: CredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, WebauthnError> {
        if self.fail {
            return Err(WebauthnError::CredentialNotFound);
        }
        Ok(AuthenticatedPublicKeyCredential {
            id: harness_types::encoding::base64url(&STUB_CREDENTIAL_ID),
            raw_id: STUB_CREDENTIAL_ID.into(),
            ty: PublicKeyCredentialType::PublicKey,
            authenticator_attachment: None,
            response: AuthenticatorAssertionResponse {
                client_data_json: b"{}".as_slice().into(),
                authenticator_data: vec![0; 37].into(),
                signature: vec![1; 16].into(),
                user_handle: Some(b"acme-corp:0000".as_slice().into()),
            },
            client_extension_results: AuthenticationExtensionsClientOutputs::default(),
        })
    }
}

pub(crate) fn creation_options(
    prf: Option<AuthenticationExtensionsPrfInputs>,
) -> CredentialCreationOptions {
    CredentialCreationOptions {
        public_key: PublicKeyCredentialCreationOptions {
            rp: PublicKeyCredentialRpEntity {
                id: Some("wallet.keyfold.dev".into()),
                name: "Keyfold Wallet".into(),
            },
            user: PublicKeyCredentialUserEntity {
                id: vec![4; 16].into(),
                name: "maya@example.com".into(),
                display_name: "Maya".into(),
            },
            challenge: vec![0; 32].into(),
            pub_key_cred_params: PublicKeyCredentialParameters::es256(),
            timeout: None,
            exclude_credentials: None,
            authenticator_selection: None,
            attestation: Default::default(),
            extensions: prf.map(|prf| AuthenticationExtensionsClientInputs { prf: Some(prf) }),
        },
    }
}

pub(crate) fn request_options(
    prf: Option<AuthenticationExtensionsPrfInputs>,
) -> CredentialRequestOptions {
    CredentialRequestOptions {
        public_key: PublicKeyCredentialRequestOptions {
            challenge: vec![0; 32].into(),
            timeout: None,
            rp_id: Some("wallet.keyfold.dev".into()),
            allow_credentials: None,
            user_verification: UserVerificationRequirement::Preferred,
            extensions: prf.map(|prf| AuthenticationExtensionsClientInputs { prf: Some(prf) }),
        },
    }
}
