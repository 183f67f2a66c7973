use async_trait::async_trait;
use ciborium::{cbor, value::Value};
use coset::iana::EnumI64;
use harness_channel::SharedAuthenticator;
use harness_authenticator::public_key_der_from_cose_key;
use harness_types::{
    crypto::sha256,
    ctap2::{get_assertion, make_credential},
    encoding, webauthn,
};
use url::Url;

use crate::{
    CeremonyProvider, RpIdVerifier, WebauthnError,
    extensions::{auth_prf_to_ctap2_input, registration_prf_to_ctap2_input},
};

/// A [`CeremonyProvider`] backed by one of the environment's virtual
/// authenticators.
///
/// This is the harness's rendition of the browser half of a WebAuthn
/// ceremony: it verifies the RP ID against the origin, assembles and hashes
/// the client data, drives the CTAP2 operation, and shapes the result into
/// the credential objects the application layer sees.
pub struct VirtualCeremonyClient {
    authenticator: SharedAuthenticator,
    rp_id_verifier: RpIdVerifier,
}

impl VirtualCeremonyClient {
    /// Build a client for a shared virtual authenticator.
    pub fn new(authenticator: SharedAuthenticator) -> Self {
        Self {
            authenticator,
            rp_id_verifier: RpIdVerifier::new(),
        }
    }

    /// Replace the RP ID verifier, e.g. to allow localhost origins.
    pub fn with_rp_id_verifier(mut self, verifier: RpIdVerifier) -> Self {
        self.rp_id_verifier = verifier;
        self
    }

    fn collected_client_data(
        ty: webauthn::ClientDataType,
        challenge: &[u8],
        origin: &Url,
    ) -> String {
        let data = webauthn::CollectedClientData {
            ty,
            challenge: encoding::base64url(challenge),
            origin: origin.as_str().trim_end_matches('/').to_owned(),
            cross_origin: None,
            unknown_keys: Default::default(),
        };
        // SAFETY: serializing this struct cannot fail.
        serde_json::to_string(&data).unwrap()
    }

    fn uv_requested(requirement: webauthn::UserVerificationRequirement, available: bool) -> bool {
        match requirement {
            webauthn::UserVerificationRequirement::Required => true,
            webauthn::UserVerificationRequirement::Preferred => available,
            webauthn::UserVerificationRequirement::Discouraged => false,
        }
    }
}

#[async_trait]
impl CeremonyProvider for VirtualCeremonyClient {
    async fn create(
        &self,
        origin: &Url,
        options: webauthn::CredentialCreationOptions,
    ) -> Result<webauthn::CreatedPublicKeyCredential, WebauthnError> {
        let request = options.public_key;
        let mut authenticator = self.authenticator.lock().await;
        let info = authenticator.get_info();
        let supported_extensions = info.extensions.unwrap_or_default();

        let rp_id = self
            .rp_id_verifier
            .assert_domain(origin, request.rp.id.as_deref())?;

        let client_data_json = Self::collected_client_data(
            webauthn::ClientDataType::Create,
            &request.challenge,
            origin,
        );
        let client_data_hash = sha256(client_data_json.as_bytes());

        let selection = request.authenticator_selection.unwrap_or_default();
        let rk = selection.require_resident_key
            || matches!(
                selection.resident_key,
                Some(webauthn::ResidentKeyRequirement::Required)
                    | Some(webauthn::ResidentKeyRequirement::Preferred)
            );
        let uv = Self::uv_requested(
            selection.user_verification,
            info.options.uv.unwrap_or_default(),
        );

        let extensions =
            registration_prf_to_ctap2_input(request.extensions.as_ref(), &supported_extensions)?;

        let response = authenticator
            .make_credential(make_credential::Request {
                client_data_hash: client_data_hash.to_vec().into(),
                rp: make_credential::PublicKeyCredentialRpEntity {
                    id: rp_id.to_owned(),
                    name: Some(request.rp.name),
                },
                user: request.user,
                pub_key_cred_params: request.pub_key_cred_params,
                exclude_list: request.exclude_credentials,
                extensions,
                options: make_credential::Options { rk, up: true, uv },
            })
            .await?;

        // SAFETY: make_credential unconditionally attests the new credential.
        let attested = response.auth_data.attested_credential_data.as_ref().unwrap();
        let credential_id = attested.credential_id().to_vec();

        let algorithm = match attested.key.alg.as_ref() {
            Some(coset::Algorithm::Assigned(alg)) => alg.to_i64(),
            Some(coset::Algorithm::PrivateUse(val)) => *val,
            _ => return Err(WebauthnError::AuthenticatorError(
                harness_types::ctap2::Ctap2Error::UnsupportedAlgorithm,
            )),
        };
        let public_key = Some(public_key_der_from_cose_key(&attested.key)?);

        let auth_data_bytes = response.auth_data.to_vec();
        // The wallet only ever requests "none" attestation.
        let attestation_object_value = cbor!({
            "fmt" => "none",
            "attStmt" => {},
            "authData" => Value::Bytes(auth_data_bytes.clone()),
        })
        // SAFETY: building a CBOR value from literals cannot fail.
        .unwrap();
        let mut attestation_object = Vec::with_capacity(auth_data_bytes.len() + 32);
        // SAFETY: serializing an in-memory CBOR value into a Vec cannot fail.
        ciborium::ser::into_writer(&attestation_object_value, &mut attestation_object).unwrap();

        let prf = response
            .unsigned_extension_outputs
            .and_then(|outputs| outputs.prf)
            .map(Into::into);

        Ok(webauthn::CreatedPublicKeyCredential {
            id: encoding::base64url(&credential_id),
            raw_id: credential_id.into(),
            ty: webauthn::PublicKeyCredentialType::PublicKey,
            authenticator_attachment: Some(authenticator.attachment_type()),
            response: webauthn::AuthenticatorAttestationResponse {
                client_data_json: client_data_json.into_bytes().into(),
                authenticator_data: auth_data_bytes.into(),
                public_key,
                public_key_algorithm: algorithm,
                attestation_object: attestation_object.into(),
                transports: Some(authenticator.transports()),
            },
            client_extension_results: webauthn::AuthenticationExtensionsClientOutputs { prf },
        })
    }

    async fn get(
        &self,
        origin: &Url,
        options: webauthn::CredentialRequestOptions,
    ) -> Result<webauthn::AuthenticatedPublicKeyCredential, WebauthnError> {
        let request = options.public_key;
        let mut authenticator = self.authenticator.lock().await;
        let info = authenticator.get_info();
        let supported_extensions = info.extensions.unwrap_or_default();

        let rp_id = self
            .rp_id_verifier
            .assert_domain(origin, request.rp_id.as_deref())?;

        let client_data_json =
            Self::collected_client_data(webauthn::ClientDataType::Get, &request.challenge, origin);
        let client_data_hash = sha256(client_data_json.as_bytes());

        let extensions = auth_prf_to_ctap2_input(&request, &supported_extensions)?;
        let uv = Self::uv_requested(
            request.user_verification,
            info.options.uv.unwrap_or_default(),
        );

        let response = authenticator
            .get_assertion(get_assertion::Request {
                rp_id: rp_id.to_owned(),
                client_data_hash: client_data_hash.to_vec().into(),
                allow_list: request.allow_credentials,
                extensions,
                options: make_credential::Options {
                    rk: false,
                    up: true,
                    uv,
                },
            })
            .await?;

        let prf = response
            .unsigned_extension_outputs
            .and_then(|outputs| outputs.prf)
            .map(Into::into);

        Ok(webauthn::AuthenticatedPublicKeyCredential {
            id: encoding::base64url(&response.credential_id),
            raw_id: response.credential_id.clone(),
            ty: webauthn::PublicKeyCredentialType::PublicKey,
            authenticator_attachment: Some(authenticator.attachment_type()),
            response: webauthn::AuthenticatorAssertionResponse {
                client_data_json: client_data_json.into_bytes().into(),
                authenticator_data: response.auth_data.to_vec().into(),
                signature: response.signature,
                user_handle: response.user_handle,
            },
            client_extension_results: webauthn::AuthenticationExtensionsClientOutputs { prf },
        })
    }
}

impl crate::CapabilityProbe for VirtualCeremonyClient {
    fn webauthn_available(&self) -> bool {
        true
    }

    fn platform_authenticator_available(&self) -> bool {
        // The virtual device answers for whatever attachment it was
        // configured with; probing must not run a ceremony, so report
        // based on construction.
        true
    }
}
