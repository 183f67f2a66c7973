//! Client extension inputs and outputs.
//!
//! The wallet only exercises the [PRF extension], which it uses to derive
//! client-side encryption keys from a credential-bound pseudo-random
//! function.
//!
//! [PRF extension]: https://w3c.github.io/webauthn/#prf-extension

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Bytes;

/// Client extension inputs for a creation or retrieval ceremony.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticationextensionsclientinputs>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExtensionsClientInputs {
    /// Inputs for the PRF extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prf: Option<AuthenticationExtensionsPrfInputs>,
}

impl AuthenticationExtensionsClientInputs {
    /// Returns `None` when no extension field is set.
    pub fn zip_contents(self) -> Option<Self> {
        let Self { prf } = &self;
        prf.is_some().then_some(self)
    }
}

/// Client extension outputs of a ceremony.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticationextensionsclientoutputs>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExtensionsClientOutputs {
    /// Results of evaluating the PRF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prf: Option<AuthenticationExtensionsPrfOutputs>,
}

/// One or two PRF evaluation inputs, or outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExtensionsPrfValues {
    /// The first PRF value.
    pub first: Bytes,

    /// The second PRF value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<Bytes>,
}

/// Inputs for the PRF extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExtensionsPrfInputs {
    /// Salts evaluated for whichever credential ends up being used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval: Option<AuthenticationExtensionsPrfValues>,

    /// Per-credential salts, keyed by the base64url encoding of the
    /// credential id. Only applicable during retrieval, and only when
    /// `allowCredentials` is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_by_credential: Option<HashMap<String, AuthenticationExtensionsPrfValues>>,
}

/// Outputs of the PRF extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationExtensionsPrfOutputs {
    /// Whether the PRF is available for the created credential. Only
    /// reported during registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// The evaluated PRF values for the salts that were sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<AuthenticationExtensionsPrfValues>,
}
