//! Client-side processing of the PRF extension: hashing the Relying
//! Party's inputs into the salts the authenticator consumes, and the
//! validation rules of <https://w3c.github.io/webauthn/#prf-extension>.

use std::collections::HashMap;

use harness_types::{
    Bytes,
    crypto::sha256,
    ctap2::{
        extensions::{AuthenticatorPrfInputs, AuthenticatorPrfValues},
        get_assertion, get_info, make_credential,
    },
    webauthn::{
        AuthenticationExtensionsClientInputs, AuthenticationExtensionsPrfInputs,
        AuthenticationExtensionsPrfValues, PublicKeyCredentialDescriptor,
        PublicKeyCredentialRequestOptions,
    },
};

use crate::WebauthnError;

type Result<T> = std::result::Result<T, WebauthnError>;

/// Build the value the CTAP2 hmac-secret extension uses as salt.
pub(crate) fn make_salt(prf_value: &Bytes) -> [u8; 32] {
    let mut message = Vec::with_capacity(13 + prf_value.len());
    message.extend_from_slice(b"WebAuthn PRF");
    message.push(0x00);
    message.extend_from_slice(prf_value);
    sha256(&message)
}

fn convert_eval(eval: &AuthenticationExtensionsPrfValues) -> AuthenticatorPrfValues {
    AuthenticatorPrfValues {
        first: make_salt(&eval.first),
        second: eval.second.as_ref().map(make_salt),
    }
}

/// Translate registration extension inputs into the authenticator's shape.
///
/// `evalByCredential` is meaningless before a credential exists and must be
/// refused with a `NotSupportedError`.
pub(crate) fn registration_prf_to_ctap2_input(
    request: Option<&AuthenticationExtensionsClientInputs>,
    supported: &[get_info::Extension],
) -> Result<Option<make_credential::ExtensionInputs>> {
    let prf = match request.and_then(|ext| ext.prf.as_ref()) {
        Some(prf) if prf.eval_by_credential.is_some() => {
            return Err(WebauthnError::NotSupportedError);
        }
        other => other,
    };

    let hmac_secret = prf
        .is_some()
        .then(|| supported.contains(&get_info::Extension::HmacSecret))
        .filter(|supported| *supported);

    let prf = prf
        .filter(|_| supported.contains(&get_info::Extension::Prf))
        .map(|prf| AuthenticatorPrfInputs {
            eval: prf.eval.as_ref().map(convert_eval),
            eval_by_credential: None,
        });

    Ok(make_credential::ExtensionInputs { hmac_secret, prf }.zip_contents())
}

/// Translate authentication extension inputs into the authenticator's
/// shape, enforcing the `evalByCredential` validation rules.
pub(crate) fn auth_prf_to_ctap2_input(
    request: &PublicKeyCredentialRequestOptions,
    supported: &[get_info::Extension],
) -> Result<Option<get_assertion::ExtensionInputs>> {
    if !supported.contains(&get_info::Extension::Prf) {
        return Ok(None);
    }
    let Some(prf) = request.extensions.as_ref().and_then(|ext| ext.prf.as_ref()) else {
        return Ok(None);
    };

    let allow_credentials = request.allow_credentials.as_deref();
    let eval_by_credential = prf.eval_by_credential.as_ref();

    // A non-empty evalByCredential requires a non-empty allow list.
    if eval_by_credential.is_some_and(|record| !record.is_empty())
        && allow_credentials.map_or(true, |allow| allow.is_empty())
    {
        return Err(WebauthnError::NotSupportedError);
    }

    let decoded_eval_by_credential = eval_by_credential
        .map(|record| decode_eval_keys(record, allow_credentials))
        .transpose()?;

    let inputs = AuthenticatorPrfInputs {
        eval: prf.eval.as_ref().map(convert_eval),
        eval_by_credential: decoded_eval_by_credential,
    };

    Ok(get_assertion::ExtensionInputs { prf: Some(inputs) }.zip_contents())
}

/// Every key must be non-empty, valid base64url, and equal to the id of
/// some allow-list entry; otherwise the request is a `SyntaxError`.
fn decode_eval_keys(
    record: &HashMap<String, AuthenticationExtensionsPrfValues>,
    allow_credentials: Option<&[PublicKeyCredentialDescriptor]>,
) -> Result<HashMap<Bytes, AuthenticatorPrfValues>> {
    record
        .iter()
        .map(|(key, values)| {
            let id =
                Bytes::try_from(key.as_str()).map_err(|_| WebauthnError::SyntaxError)?;
            let known = !id.is_empty()
                && allow_credentials
                    .is_some_and(|allow| allow.iter().any(|cred| cred.id == id));
            if !known {
                return Err(WebauthnError::SyntaxError);
            }
            Ok((id, convert_eval(values)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use harness_types::webauthn::{self, UserVerificationRequirement};

    use super::*;

    fn prf_inputs(
        eval: Option<AuthenticationExtensionsPrfValues>,
        eval_by_credential: Option<HashMap<String, AuthenticationExtensionsPrfValues>>,
    ) -> AuthenticationExtensionsClientInputs {
        AuthenticationExtensionsClientInputs {
            prf: Some(AuthenticationExtensionsPrfInputs {
                eval,
                eval_by_credential,
            }),
        }
    }

    fn request_options(
        allow: Option<Vec<PublicKeyCredentialDescriptor>>,
        extensions: AuthenticationExtensionsClientInputs,
    ) -> PublicKeyCredentialRequestOptions {
        PublicKeyCredentialRequestOptions {
            challenge: vec![0; 32].into(),
            timeout: None,
            rp_id: Some("wallet.keyfold.dev".into()),
            allow_credentials: allow,
            user_verification: UserVerificationRequirement::Preferred,
            extensions: Some(extensions),
        }
    }

    const FULL_SUPPORT: &[get_info::Extension] =
        &[get_info::Extension::HmacSecret, get_info::Extension::Prf];

    #[test]
    fn registration_refuses_eval_by_credential() {
        let ext = prf_inputs(None, Some(HashMap::new()));
        assert!(matches!(
            registration_prf_to_ctap2_input(Some(&ext), FULL_SUPPORT),
            Err(WebauthnError::NotSupportedError)
        ));
    }

    #[test]
    fn registration_requests_hmac_secret_when_supported() {
        let ext = prf_inputs(None, None);
        let inputs = registration_prf_to_ctap2_input(Some(&ext), FULL_SUPPORT)
            .expect("valid request")
            .expect("prf requested");
        assert_eq!(inputs.hmac_secret, Some(true));
        assert!(inputs.prf.is_some());
    }

    #[test]
    fn auth_without_authenticator_support_drops_prf() {
        let ext = prf_inputs(None, None);
        let options = request_options(None, ext);
        assert!(matches!(auth_prf_to_ctap2_input(&options, &[]), Ok(None)));
    }

    #[test]
    fn eval_by_credential_requires_allow_list() {
        let salts = AuthenticationExtensionsPrfValues {
            first: vec![1; 16].into(),
            second: None,
        };
        let ext = prf_inputs(
            None,
            Some(HashMap::from([(String::from("AAEC"), salts)])),
        );
        let options = request_options(None, ext);
        assert!(matches!(
            auth_prf_to_ctap2_input(&options, FULL_SUPPORT),
            Err(WebauthnError::NotSupportedError)
        ));
    }

    #[test]
    fn unknown_or_malformed_keys_are_syntax_errors() {
        let salts = AuthenticationExtensionsPrfValues {
            first: vec![1; 16].into(),
            second: None,
        };
        let allow = vec![PublicKeyCredentialDescriptor {
            ty: webauthn::PublicKeyCredentialType::PublicKey,
            id: vec![9; 16].into(),
            transports: None,
        }];

        for bad_key in ["", "!!!", "AAEC"] {
            let ext = prf_inputs(
                None,
                Some(HashMap::from([(bad_key.to_owned(), salts.clone())])),
            );
            let options = request_options(Some(allow.clone()), ext);
            assert!(
                matches!(
                    auth_prf_to_ctap2_input(&options, FULL_SUPPORT),
                    Err(WebauthnError::SyntaxError)
                ),
                "key {bad_key:?} must be a syntax error",
            );
        }
    }
}
