use harness_types::ctap2::{
    AuthenticatorData, Ctap2Error, Flags,
    get_assertion::{Request, Response, UnsignedExtensionOutputs},
};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};

use crate::{
    Authenticator, CredentialStore, UiHint, UserValidationMethod, private_key_from_cose_key,
};

impl<S, U> Authenticator<S, U>
where
    S: CredentialStore + Send + Sync,
    U: UserValidationMethod + Send + Sync,
{
    /// Produce an assertion over the client data hash.
    ///
    /// <https://fidoalliance.org/specs/fido-v2.0-ps-20190130/fido-client-to-authenticator-protocol-v2.0-ps-20190130.html#authenticatorGetAssertion>
    pub async fn get_assertion(&mut self, request: Request) -> Result<Response, Ctap2Error> {
        let allow_list = request.allow_list.as_deref().filter(|l| !l.is_empty());
        let candidates = match self
            .store()
            .find_credentials(allow_list, &request.rp_id)
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                // The user must interact before the device discloses that
                // nothing matched.
                let _ = self
                    .user_validation()
                    .check_user(UiHint::InformNoCredentialsFound, true, false)
                    .await;
                return Err(err);
            }
        };

        // SAFETY: find_credentials errors instead of returning an empty list.
        let mut passkey = candidates.into_iter().next().unwrap();

        let user_flags = self
            .check_user(
                &request.options,
                UiHint::RequestExistingCredential(&passkey),
            )
            .await?;

        passkey.counter = passkey.counter.map(|count| count + 1);

        let prf = request
            .extensions
            .and_then(|ext| ext.zip_contents())
            .and_then(|ext| ext.prf)
            .and_then(|inputs| {
                self.get_prf(
                    &passkey.credential_id,
                    passkey.extensions.hmac_secret.as_ref(),
                    &inputs,
                    user_flags.contains(Flags::UV),
                )
            });

        let auth_data = AuthenticatorData::new(&request.rp_id, passkey.counter)
            .with_flags(user_flags | self.base_flags());

        let secret_key = private_key_from_cose_key(&passkey.key)?;
        let signer = SigningKey::from(secret_key);
        let mut message = auth_data.to_vec();
        message.extend_from_slice(&request.client_data_hash);
        let signature: Signature = signer.sign(&message);

        self.store_mut().update_credential(passkey.clone()).await?;

        Ok(Response {
            credential_id: passkey.credential_id.clone(),
            auth_data,
            signature: signature.to_der().as_bytes().to_vec().into(),
            user_handle: passkey.user_handle.clone(),
            unsigned_extension_outputs: UnsignedExtensionOutputs { prf }.zip_contents(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use harness_types::{
        Bytes,
        ctap2::{
            Aaguid, Ctap2Error,
            extensions::{AuthenticatorPrfInputs, AuthenticatorPrfValues},
            get_assertion, make_credential,
        },
        webauthn,
    };

    use crate::{
        Authenticator, AuthenticatorCapabilities, MemoryStore, ToggleUserValidation,
    };
    use crate::authenticator::make_credential::tests::good_request;

    type TestAuthenticator = Authenticator<MemoryStore, ToggleUserValidation>;

    fn platform_authenticator() -> TestAuthenticator {
        Authenticator::new(
            Aaguid::new_empty(),
            AuthenticatorCapabilities::platform(),
            MemoryStore::new(),
            ToggleUserValidation::new(),
        )
    }

    async fn register(authenticator: &mut TestAuthenticator, prf_secret: bool) -> Bytes {
        let mut request = good_request(true);
        if prf_secret {
            request.extensions = Some(make_credential::ExtensionInputs {
                hmac_secret: Some(true),
                prf: None,
            });
        }
        let response = authenticator
            .make_credential(request)
            .await
            .expect("creation should succeed");
        response
            .auth_data
            .attested_credential_data
            .expect("attested credential data must be present")
            .credential_id()
            .into()
    }

    fn assertion_request(credential_id: Option<Bytes>) -> get_assertion::Request {
        get_assertion::Request {
            rp_id: "wallet.keyfold.dev".into(),
            client_data_hash: harness_types::rand::random_vec(32).into(),
            allow_list: credential_id.map(|id| {
                vec![webauthn::PublicKeyCredentialDescriptor {
                    ty: webauthn::PublicKeyCredentialType::PublicKey,
                    id,
                    transports: None,
                }]
            }),
            extensions: None,
            options: make_credential::Options {
                rk: false,
                up: true,
                uv: true,
            },
        }
    }

    #[tokio::test]
    async fn asserts_with_a_discoverable_credential() {
        let mut authenticator = platform_authenticator();
        let credential_id = register(&mut authenticator, false).await;

        let response = authenticator
            .get_assertion(assertion_request(None))
            .await
            .expect("assertion should succeed");

        assert_eq!(response.credential_id, credential_id);
        assert!(response.user_handle.is_some());
        assert!(!response.signature.is_empty());
    }

    #[tokio::test]
    async fn no_credentials_for_unknown_rp() {
        let mut authenticator = platform_authenticator();
        register(&mut authenticator, false).await;

        let mut request = assertion_request(None);
        request.rp_id = "other.example.com".into();
        let result = authenticator.get_assertion(request).await;
        assert_eq!(
            result.expect_err("no credential is scoped to that rp"),
            Ctap2Error::NoCredentials
        );
    }

    #[tokio::test]
    async fn prf_selects_the_salts_for_the_asserted_credential() {
        let mut authenticator = platform_authenticator();
        let credential_a = register(&mut authenticator, true).await;
        let credential_b = register(&mut authenticator, true).await;

        let salts_a = AuthenticatorPrfValues {
            first: [5; 32],
            second: None,
        };
        let salts_b = AuthenticatorPrfValues {
            first: [6; 32],
            second: None,
        };

        let mut request = assertion_request(Some(credential_a.clone()));
        request.extensions = Some(get_assertion::ExtensionInputs {
            prf: Some(AuthenticatorPrfInputs {
                eval: None,
                eval_by_credential: Some(HashMap::from([
                    (credential_a.clone(), salts_a),
                    (credential_b.clone(), salts_b),
                ])),
            }),
        });

        let response = authenticator
            .get_assertion(request)
            .await
            .expect("assertion should succeed");
        let outputs_for_a = response
            .unsigned_extension_outputs
            .and_then(|ext| ext.prf)
            .expect("prf outputs expected")
            .results;

        // Evaluating A's salts against A's secret through the single-eval
        // path must agree, proving the per-credential selection picked A.
        let mut control = assertion_request(Some(credential_a));
        control.extensions = Some(get_assertion::ExtensionInputs {
            prf: Some(AuthenticatorPrfInputs {
                eval: Some(salts_a),
                eval_by_credential: None,
            }),
        });
        let control_outputs = authenticator
            .get_assertion(control)
            .await
            .expect("assertion should succeed")
            .unsigned_extension_outputs
            .and_then(|ext| ext.prf)
            .expect("prf outputs expected")
            .results;

        assert_eq!(outputs_for_a, control_outputs);
    }
}
