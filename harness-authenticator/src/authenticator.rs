use coset::iana;
use harness_types::{
    ctap2::{Aaguid, Ctap2Error, Flags, make_credential::Options},
    webauthn,
};

use crate::{
    AuthenticatorCapabilities, CredentialStore, UiHint, UserValidationMethod,
};

mod extensions;
mod get_assertion;
mod get_info;
mod make_credential;

/// A software authenticator with harness-controllable capabilities.
///
/// One instance models one virtual device added through the automation
/// channel. Ceremonies reach it through the ceremony client; lifecycle
/// commands reach it through the channel host. Both address the same state.
pub struct Authenticator<S, U> {
    /// The authenticator's AAGUID.
    aaguid: Aaguid,
    /// The capability switches the device was added with.
    capabilities: AuthenticatorCapabilities,
    /// Credential storage.
    store: S,
    /// Algorithms this device can sign with.
    algs: Vec<iana::Algorithm>,
    /// Provider of user presence and verification.
    user_validation: U,
}

impl<S, U> Authenticator<S, U>
where
    S: CredentialStore + Send + Sync,
    U: UserValidationMethod + Send + Sync,
{
    /// Create an authenticator from its capability switches, a backing
    /// store and a user validation method.
    pub fn new(
        aaguid: Aaguid,
        capabilities: AuthenticatorCapabilities,
        store: S,
        user_validation: U,
    ) -> Self {
        Self {
            aaguid,
            capabilities,
            store,
            algs: vec![iana::Algorithm::ES256],
            user_validation,
        }
    }

    /// Read access to the credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Exclusive access to the credential store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The authenticator's AAGUID.
    pub fn aaguid(&self) -> &Aaguid {
        &self.aaguid
    }

    /// The capability switches the device was added with.
    pub fn capabilities(&self) -> &AuthenticatorCapabilities {
        &self.capabilities
    }

    /// Read access to the user validation method.
    pub fn user_validation(&self) -> &U {
        &self.user_validation
    }

    /// Exclusive access to the user validation method.
    pub fn user_validation_mut(&mut self) -> &mut U {
        &mut self.user_validation
    }

    /// The attachment modality implied by the configured transport.
    pub fn attachment_type(&self) -> webauthn::AuthenticatorAttachment {
        match self.capabilities.transport {
            webauthn::AuthenticatorTransport::Internal => {
                webauthn::AuthenticatorAttachment::Platform
            }
            _ => webauthn::AuthenticatorAttachment::CrossPlatform,
        }
    }

    /// The transports reported on created credentials.
    pub fn transports(&self) -> Vec<webauthn::AuthenticatorTransport> {
        vec![self.capabilities.transport]
    }

    /// Choose the first requested algorithm this device supports, while
    /// validating every element of `params`.
    pub fn choose_algorithm(
        &self,
        params: &[webauthn::PublicKeyCredentialParameters],
    ) -> Result<iana::Algorithm, Ctap2Error> {
        params
            .iter()
            .find(|param| self.algs.contains(&param.alg))
            .map(|param| param.alg)
            .ok_or(Ctap2Error::UnsupportedAlgorithm)
    }

    /// Collect user consent before touching any credential state, per the
    /// CTAP privacy rules: the device must not disclose the existence of a
    /// credential until the user has interacted with it.
    async fn check_user(&self, options: &Options, hint: UiHint<'_>) -> Result<Flags, Ctap2Error> {
        if options.uv && self.user_validation.is_verification_enabled() != Some(true) {
            return Err(Ctap2Error::UnsupportedOption);
        }

        let check = self
            .user_validation
            .check_user(hint, options.up, options.uv)
            .await?;

        if options.up && !check.presence {
            return Err(Ctap2Error::OperationDenied);
        }
        if options.uv && !check.verification {
            return Err(Ctap2Error::OperationDenied);
        }

        let mut flags = Flags::empty();
        if check.presence {
            flags |= Flags::UP;
        }
        if check.verification {
            flags |= Flags::UV;
        }
        Ok(flags)
    }

    /// Backup eligibility and state bits carried on every authenticator
    /// data this device produces.
    fn base_flags(&self) -> Flags {
        let mut flags = Flags::empty();
        if self.capabilities.backup_eligible {
            flags |= Flags::BE;
        }
        if self.capabilities.backup_state {
            flags |= Flags::BS;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, MockUserValidationMethod, UserCheck};

    fn authenticator(
        user_mock: MockUserValidationMethod,
    ) -> Authenticator<MemoryStore, MockUserValidationMethod> {
        Authenticator::new(
            Aaguid::new_empty(),
            AuthenticatorCapabilities::platform(),
            MemoryStore::new(),
            user_mock,
        )
    }

    #[tokio::test]
    async fn check_user_reports_up_and_uv() {
        let mut user_mock = MockUserValidationMethod::new();
        user_mock
            .expect_is_verification_enabled()
            .returning(|| Some(true));
        user_mock
            .expect_check_user()
            .returning(|_, _, _| {
                Ok(UserCheck {
                    presence: true,
                    verification: true,
                })
            })
            .once();

        let authenticator = authenticator(user_mock);
        let options = Options {
            up: true,
            uv: true,
            ..Default::default()
        };
        let flags = authenticator
            .check_user(&options, UiHint::InformNoCredentialsFound)
            .await
            .expect("user check should pass");
        assert_eq!(flags, Flags::UP | Flags::UV);
    }

    #[tokio::test]
    async fn check_user_denies_when_verification_fails() {
        let mut user_mock = MockUserValidationMethod::new();
        user_mock
            .expect_is_verification_enabled()
            .returning(|| Some(true));
        user_mock
            .expect_check_user()
            .returning(|_, _, _| {
                Ok(UserCheck {
                    presence: true,
                    verification: false,
                })
            })
            .once();

        let authenticator = authenticator(user_mock);
        let options = Options {
            up: true,
            uv: true,
            ..Default::default()
        };
        let result = authenticator
            .check_user(&options, UiHint::InformNoCredentialsFound)
            .await;
        assert_eq!(result, Err(Ctap2Error::OperationDenied));
    }

    #[tokio::test]
    async fn check_user_rejects_uv_on_incapable_device() {
        let mut user_mock = MockUserValidationMethod::new();
        user_mock.expect_is_verification_enabled().returning(|| None);

        let authenticator = authenticator(user_mock);
        let options = Options {
            up: true,
            uv: true,
            ..Default::default()
        };
        let result = authenticator
            .check_user(&options, UiHint::InformNoCredentialsFound)
            .await;
        assert_eq!(result, Err(Ctap2Error::UnsupportedOption));
    }
}
