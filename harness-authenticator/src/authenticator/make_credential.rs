use harness_types::{
    Passkey,
    ctap2::{
        AttestedCredentialData, AuthenticatorData, Ctap2Error, Flags,
        make_credential::{Request, Response, UnsignedExtensionOutputs},
    },
    rand::random_vec,
};
use p256::SecretKey;

use crate::{Authenticator, CoseKeyPair, CredentialStore, UiHint, UserValidationMethod};

impl<S, U> Authenticator<S, U>
where
    S: CredentialStore + Send + Sync,
    U: UserValidationMethod + Send + Sync,
{
    /// Create a new credential.
    ///
    /// <https://fidoalliance.org/specs/fido-v2.0-ps-20190130/fido-client-to-authenticator-protocol-v2.0-ps-20190130.html#authenticatorMakeCredential>
    pub async fn make_credential(&mut self, request: Request) -> Result<Response, Ctap2Error> {
        // Refuse re-registration of an excluded credential, but only after
        // the user interacted with the device.
        if let Some(exclude_list) = request.exclude_list.as_deref().filter(|l| !l.is_empty()) {
            if let Ok(excluded) = self
                .store()
                .find_credentials(Some(exclude_list), &request.rp.id)
                .await
            {
                if let Some(hit) = excluded.first() {
                    let _ = self
                        .user_validation()
                        .check_user(UiHint::InformExcludedCredentialFound(hit), true, false)
                        .await;
                    return Err(Ctap2Error::CredentialExcluded);
                }
            }
        }

        let algorithm = self.choose_algorithm(&request.pub_key_cred_params)?;

        if request.options.rk && !self.capabilities().has_resident_key {
            return Err(Ctap2Error::UnsupportedOption);
        }

        let user_flags = self
            .check_user(
                &request.options,
                UiHint::RequestNewCredential(&request.user, &request.rp),
            )
            .await?;

        let private_key = SecretKey::random(&mut rand::thread_rng());
        let CoseKeyPair { public, private } = CoseKeyPair::from_secret_key(&private_key, algorithm);
        let credential_id = random_vec(16);

        let (credential_extensions, prf) =
            self.make_extensions(request.extensions.as_ref(), user_flags.contains(Flags::UV));

        let counter = self.capabilities().with_signature_counter.then_some(0);
        let passkey = Passkey {
            key: private,
            credential_id: credential_id.clone().into(),
            rp_id: request.rp.id.clone(),
            user_handle: request.options.rk.then(|| request.user.id.clone()),
            counter,
            extensions: credential_extensions,
        };

        log::debug!(
            "storing new credential for rp `{}` ({} bytes of id)",
            request.rp.id,
            credential_id.len()
        );
        self.store_mut()
            .save_credential(passkey, request.user.clone(), request.rp.clone())
            .await?;

        let attested_credential_data =
            AttestedCredentialData::new(*self.aaguid(), credential_id, public)
                .map_err(|_| Ctap2Error::InvalidCredential)?;
        let auth_data = AuthenticatorData::new(&request.rp.id, counter)
            .with_flags(user_flags | self.base_flags())
            .with_attested_credential_data(attested_credential_data);

        Ok(Response {
            auth_data,
            unsigned_extension_outputs: UnsignedExtensionOutputs { prf }.zip_contents(),
        })
    }
}
