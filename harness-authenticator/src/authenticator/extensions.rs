//! Authenticator-side processing of the hmac-secret/PRF extension.
//!
//! PRF-capable virtual devices store a random per-credential secret and
//! evaluate salts against it with HMAC-SHA256, both at creation time (the
//! hmac-secret-mc behavior of an in-memory authenticator) and on every
//! assertion. Devices added without PRF support report the extension as
//! disabled so the wallet's fallback paths can be exercised.

use harness_types::{
    Bytes, CredentialExtensions, StoredHmacSecret,
    crypto::hmac_sha256,
    ctap2::extensions::{
        AuthenticatorPrfGetOutputs, AuthenticatorPrfInputs, AuthenticatorPrfMakeOutputs,
        AuthenticatorPrfValues,
    },
    ctap2::make_credential,
    rand::random_vec,
};

use crate::{Authenticator, CredentialStore, UserValidationMethod};

impl<S, U> Authenticator<S, U>
where
    S: CredentialStore + Send + Sync,
    U: UserValidationMethod + Send + Sync,
{
    /// Provision extension state for a new credential and compute the
    /// creation-time PRF outputs.
    pub(super) fn make_extensions(
        &self,
        request: Option<&make_credential::ExtensionInputs>,
        uv: bool,
    ) -> (CredentialExtensions, Option<AuthenticatorPrfMakeOutputs>) {
        let Some(request) = request else {
            return (CredentialExtensions::default(), None);
        };

        if !self.capabilities().supports_prf {
            // Still answer a PRF request, with enabled = false.
            let outputs = request.prf.as_ref().map(|_| AuthenticatorPrfMakeOutputs {
                enabled: false,
                results: None,
            });
            return (CredentialExtensions::default(), outputs);
        }

        let wants_secret = request.hmac_secret.unwrap_or(false) || request.prf.is_some();
        if !wants_secret {
            return (CredentialExtensions::default(), None);
        }

        let secret = StoredHmacSecret {
            cred_with_uv: random_vec(32),
            cred_without_uv: Some(random_vec(32)),
        };

        let results = request
            .prf
            .as_ref()
            .and_then(|prf| prf.eval.as_ref())
            .map(|salts| evaluate(&secret, salts, uv));

        let outputs = request.prf.as_ref().map(|_| AuthenticatorPrfMakeOutputs {
            enabled: true,
            results,
        });

        (
            CredentialExtensions {
                hmac_secret: Some(secret),
            },
            outputs,
        )
    }

    /// Evaluate the PRF for an assertion, selecting the salts registered
    /// for the asserted credential.
    pub(super) fn get_prf(
        &self,
        credential_id: &Bytes,
        stored: Option<&StoredHmacSecret>,
        inputs: &AuthenticatorPrfInputs,
        uv: bool,
    ) -> Option<AuthenticatorPrfGetOutputs> {
        if !self.capabilities().supports_prf {
            return None;
        }
        let secret = stored?;
        let salts = inputs
            .eval_by_credential
            .as_ref()
            .and_then(|by_credential| by_credential.get(credential_id))
            .or(inputs.eval.as_ref())?;

        Some(AuthenticatorPrfGetOutputs {
            results: evaluate(secret, salts, uv),
        })
    }
}

fn evaluate(secret: &StoredHmacSecret, salts: &AuthenticatorPrfValues, uv: bool) -> AuthenticatorPrfValues {
    let key = if uv {
        &secret.cred_with_uv
    } else {
        secret
            .cred_without_uv
            .as_ref()
            .unwrap_or(&secret.cred_with_uv)
    };
    AuthenticatorPrfValues {
        first: hmac_sha256(key, &salts.first),
        second: salts.second.map(|salt| hmac_sha256(key, &salt)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> StoredHmacSecret {
        StoredHmacSecret {
            cred_with_uv: vec![1; 32],
            cred_without_uv: Some(vec![2; 32]),
        }
    }

    #[test]
    fn evaluation_is_deterministic_and_salt_sensitive() {
        let salts = AuthenticatorPrfValues {
            first: [3; 32],
            second: Some([4; 32]),
        };
        let a = evaluate(&secret(), &salts, true);
        let b = evaluate(&secret(), &salts, true);
        assert_eq!(a, b);
        assert_ne!(Some(a.first), a.second);
    }

    #[test]
    fn verification_state_selects_the_key() {
        let salts = AuthenticatorPrfValues {
            first: [3; 32],
            second: None,
        };
        let with_uv = evaluate(&secret(), &salts, true);
        let without_uv = evaluate(&secret(), &salts, false);
        assert_ne!(with_uv.first, without_uv.first);
    }
}
