use std::sync::atomic::{AtomicBool, Ordering};

use harness_types::{
    Passkey,
    ctap2::{Ctap2Error, make_credential::PublicKeyCredentialRpEntity},
    webauthn::PublicKeyCredentialUserEntity,
};

/// Additional information a user-facing authenticator could display while
/// collecting consent.
#[derive(Debug, Clone, PartialEq)]
pub enum UiHint<'a> {
    /// The operation cannot proceed: an excluded credential already exists.
    InformExcludedCredentialFound(&'a Passkey),

    /// The operation cannot proceed: no matching credential exists.
    InformNoCredentialsFound,

    /// Permission to create a credential for this user and relying party.
    RequestNewCredential(&'a PublicKeyCredentialUserEntity, &'a PublicKeyCredentialRpEntity),

    /// Permission to assert with this existing credential.
    RequestExistingCredential(&'a Passkey),
}

/// The result of a user validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserCheck {
    /// Whether the user was present.
    pub presence: bool,

    /// Whether the user was verified.
    pub verification: bool,
}

/// Plug point for user interaction and verification.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait UserValidationMethod {
    /// Check for the user's presence and, when requested, verify them.
    async fn check_user<'a>(
        &self,
        hint: UiHint<'a>,
        presence: bool,
        verification: bool,
    ) -> Result<UserCheck, Ctap2Error>;

    /// Whether this method can test user presence.
    fn is_presence_enabled(&self) -> bool;

    /// `Some(true)` when user verification is available and configured,
    /// `Some(false)` when available but not configured, `None` when the
    /// device cannot verify the user at all.
    fn is_verification_enabled(&self) -> Option<bool>;
}

/// The harness's user: always present, and verified according to a flag the
/// automation channel can flip at any point to simulate UV failures.
#[derive(Debug)]
pub struct ToggleUserValidation {
    uv_capable: bool,
    verified: AtomicBool,
}

impl ToggleUserValidation {
    /// A user on a UV-capable device, currently passing verification.
    pub fn new() -> Self {
        Self {
            uv_capable: true,
            verified: AtomicBool::new(true),
        }
    }

    /// A user on a device without any user verification method.
    pub fn without_uv() -> Self {
        Self {
            uv_capable: false,
            verified: AtomicBool::new(false),
        }
    }

    /// Set whether subsequent ceremonies report successful verification.
    pub fn set_user_verified(&self, verified: bool) {
        self.verified.store(verified, Ordering::Relaxed);
    }

    /// The currently configured verification outcome.
    pub fn user_verified(&self) -> bool {
        self.verified.load(Ordering::Relaxed)
    }
}

impl Default for ToggleUserValidation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserValidationMethod for ToggleUserValidation {
    async fn check_user<'a>(
        &self,
        _hint: UiHint<'a>,
        presence: bool,
        verification: bool,
    ) -> Result<UserCheck, Ctap2Error> {
        Ok(UserCheck {
            presence,
            verification: verification && self.uv_capable && self.user_verified(),
        })
    }

    fn is_presence_enabled(&self) -> bool {
        true
    }

    fn is_verification_enabled(&self) -> Option<bool> {
        self.uv_capable.then_some(true)
    }
}
