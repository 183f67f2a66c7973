//! # Harness Client
//!
//! The ceremony layer of the wallet harness. A [`CeremonyProvider`] is the
//! injected stand-in for the browser's credential API; the
//! [`VirtualCeremonyClient`] implements it against a virtual authenticator,
//! and the [`CeremonyInterceptor`] decorates any provider with operation
//! tracking and deterministic PRF emulation. On top of those,
//! [`BackendClient`] orchestrates the wallet backend's begin/finish flows,
//! tenant scoping included.

use async_trait::async_trait;
use harness_types::{
    ctap2::Ctap2Error,
    webauthn::{
        AuthenticatedPublicKeyCredential, CreatedPublicKeyCredential, CredentialCreationOptions,
        CredentialRequestOptions,
    },
};
use url::Url;

mod adapter;
mod client;
mod config;
mod extensions;
mod interceptor;
mod orchestration;
mod prf_emulator;
mod rp_id;
#[cfg(test)]
mod tests_support;
pub mod wire;

pub use adapter::{AdapterError, CapabilityProbe, ExternalAuthenticatorAdapter};
pub use client::VirtualCeremonyClient;
pub use config::{ConfigError, HarnessConfig};
pub use interceptor::{CeremonyInterceptor, OperationKind, OperationRecord};
pub use orchestration::{BackendClient, BackendError, LoginOutcome, RegistrationOutcome};
pub use prf_emulator::PrfEmulator;
pub use rp_id::RpIdVerifier;

/// Errors produced by WebAuthn ceremony processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebauthnError {
    /// The request origin was missing a proper domain part.
    OriginMissingDomain,
    /// The request origin is not a sub-domain of the RP ID.
    OriginRpMismatch,
    /// The origin of the request does not use HTTPS.
    UnprotectedOrigin,
    /// Origin was localhost but the verifier does not allow it.
    InsecureLocalhostNotAllowed,
    /// The RP ID is invalid.
    InvalidRpId,
    /// No matching credential was found.
    CredentialNotFound,
    /// The extension input combination is not supported, e.g.
    /// `evalByCredential` during registration.
    NotSupportedError,
    /// An extension input did not parse, e.g. a malformed credential id key.
    SyntaxError,
    /// A second ceremony was issued while one is still pending on this
    /// provider. WebAuthn serializes ceremonies per page.
    OperationPending,
    /// The authenticator rejected the operation.
    AuthenticatorError(Ctap2Error),
}

impl From<Ctap2Error> for WebauthnError {
    fn from(value: Ctap2Error) -> Self {
        match value {
            Ctap2Error::NoCredentials => WebauthnError::CredentialNotFound,
            other => WebauthnError::AuthenticatorError(other),
        }
    }
}

impl std::fmt::Display for WebauthnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OriginMissingDomain => f.write_str("request origin has no domain"),
            Self::OriginRpMismatch => f.write_str("origin is not within the RP ID"),
            Self::UnprotectedOrigin => f.write_str("origin does not use https"),
            Self::InsecureLocalhostNotAllowed => {
                f.write_str("localhost origin without allows_insecure_localhost")
            }
            Self::InvalidRpId => f.write_str("invalid RP ID"),
            Self::CredentialNotFound => f.write_str("no credential was found"),
            Self::NotSupportedError => f.write_str("NotSupportedError"),
            Self::SyntaxError => f.write_str("SyntaxError"),
            Self::OperationPending => f.write_str("a ceremony is already pending"),
            Self::AuthenticatorError(err) => write!(f, "authenticator error: {err}"),
        }
    }
}

impl std::error::Error for WebauthnError {}

/// The two credential entry points of the browser, as an injectable
/// dependency.
///
/// Production code receives a provider instead of reaching for a global, so
/// the harness can hand it a decorated implementation; see
/// [`CeremonyInterceptor`].
#[async_trait]
pub trait CeremonyProvider: Send + Sync {
    /// Run a credential creation ceremony (`navigator.credentials.create`).
    async fn create(
        &self,
        origin: &Url,
        options: CredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, WebauthnError>;

    /// Run a credential retrieval ceremony (`navigator.credentials.get`).
    async fn get(
        &self,
        origin: &Url,
        options: CredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, WebauthnError>;
}
