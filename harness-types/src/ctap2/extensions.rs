//! Authenticator-side structures of the PRF / hmac-secret extension.
//!
//! The ceremony layer hashes the Relying Party's PRF inputs into salts
//! before they reach the authenticator, so the values here are always
//! exactly 32 bytes.

use std::collections::HashMap;

use crate::{Bytes, webauthn};

/// PRF inputs after client-side processing.
#[derive(Debug, Clone, Default)]
pub struct AuthenticatorPrfInputs {
    /// Salts evaluated for whichever credential is selected.
    pub eval: Option<AuthenticatorPrfValues>,

    /// Per-credential salts, keyed by the decoded credential id.
    pub eval_by_credential: Option<HashMap<Bytes, AuthenticatorPrfValues>>,
}

/// One or two already-hashed PRF salts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorPrfValues {
    /// The hashed first salt.
    pub first: [u8; 32],

    /// The hashed second salt.
    pub second: Option<[u8; 32]>,
}

impl From<AuthenticatorPrfValues> for webauthn::AuthenticationExtensionsPrfValues {
    fn from(value: AuthenticatorPrfValues) -> Self {
        Self {
            first: value.first.into(),
            second: value.second.map(Into::into),
        }
    }
}

/// PRF outputs of a credential creation.
#[derive(Debug, Clone)]
pub struct AuthenticatorPrfMakeOutputs {
    /// Whether the new credential can evaluate the PRF at all.
    pub enabled: bool,

    /// Evaluated salts, when the authenticator supports evaluation at
    /// creation time.
    pub results: Option<AuthenticatorPrfValues>,
}

impl From<AuthenticatorPrfMakeOutputs> for webauthn::AuthenticationExtensionsPrfOutputs {
    fn from(value: AuthenticatorPrfMakeOutputs) -> Self {
        Self {
            enabled: Some(value.enabled),
            results: value.results.map(Into::into),
        }
    }
}

/// PRF outputs of an assertion.
#[derive(Debug, Clone)]
pub struct AuthenticatorPrfGetOutputs {
    /// The evaluated salts for the asserted credential.
    pub results: AuthenticatorPrfValues,
}

impl From<AuthenticatorPrfGetOutputs> for webauthn::AuthenticationExtensionsPrfOutputs {
    fn from(value: AuthenticatorPrfGetOutputs) -> Self {
        Self {
            enabled: None,
            results: Some(value.results.into()),
        }
    }
}
