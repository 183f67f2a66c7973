use std::time::Duration;

use url::Url;

use harness_types::webauthn::{
    AuthenticatedPublicKeyCredential, CreatedPublicKeyCredential, CredentialCreationOptions,
    CredentialRequestOptions,
};

use crate::{CeremonyInterceptor, CeremonyProvider, OperationKind, OperationRecord, WebauthnError};

/// What a ceremony target can report about its environment.
///
/// CI machines frequently lack a platform authenticator (or any WebAuthn
/// facility at all), so every probe degrades to `false` instead of failing.
pub trait CapabilityProbe {
    /// Whether the credential API exists at all.
    fn webauthn_available(&self) -> bool {
        false
    }

    /// Whether a platform (built-in) authenticator is usable.
    fn platform_authenticator_available(&self) -> bool {
        false
    }

    /// Whether conditional-mediation (autofill) requests are usable.
    fn conditional_mediation_available(&self) -> bool {
        false
    }
}

/// Waiter errors of the external-authenticator adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// No ceremony resolved within the allotted time.
    #[error("no ceremony resolved within {0:?}")]
    Timeout(Duration),
    /// A ceremony resolved, but not the kind the test was waiting on.
    #[error("expected a {expected} ceremony but a {actual} ceremony resolved")]
    WrongOperation {
        /// The ceremony kind the waiter was for.
        expected: OperationKind,
        /// The ceremony kind that actually resolved.
        actual: OperationKind,
    },
    /// The awaited ceremony resolved with a failure.
    #[error("{kind} ceremony failed: {message}")]
    Failed {
        /// The ceremony kind that failed.
        kind: OperationKind,
        /// The recorded error string.
        message: String,
    },
}

/// Operation tracking over an authenticator the harness cannot inject
/// credentials into: the platform's own authenticator, or an external
/// software FIDO2 process presenting as a real USB device.
///
/// Every credential must come from an actual ceremony here, so the adapter
/// offers the same tracking contract as the interceptor plus typed waiters
/// that validate what resolved.
pub struct ExternalAuthenticatorAdapter<P> {
    interceptor: CeremonyInterceptor<P>,
}

impl<P: CeremonyProvider + CapabilityProbe> ExternalAuthenticatorAdapter<P> {
    /// Wrap a non-injectable ceremony target.
    pub fn new(provider: P) -> Self {
        Self {
            interceptor: CeremonyInterceptor::new(provider),
        }
    }

    /// Whether the credential API exists at all.
    pub fn webauthn_available(&self) -> bool {
        self.interceptor.inner().webauthn_available()
    }

    /// Whether a platform authenticator is usable.
    pub fn platform_authenticator_available(&self) -> bool {
        self.interceptor.inner().platform_authenticator_available()
    }

    /// Whether conditional-mediation requests are usable.
    pub fn conditional_mediation_available(&self) -> bool {
        self.interceptor.inner().conditional_mediation_available()
    }

    /// Run a tracked creation ceremony.
    pub async fn create(
        &self,
        origin: &Url,
        options: CredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, WebauthnError> {
        self.interceptor.create(origin, options).await
    }

    /// Run a tracked retrieval ceremony.
    pub async fn get(
        &self,
        origin: &Url,
        options: CredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, WebauthnError> {
        self.interceptor.get(origin, options).await
    }

    /// See [`CeremonyInterceptor::wait_for_operation`].
    pub async fn wait_for_operation(&self, timeout: Duration) -> Option<OperationRecord> {
        self.interceptor.wait_for_operation(timeout).await
    }

    /// The most recently resolved operation.
    pub fn last_operation(&self) -> Option<OperationRecord> {
        self.interceptor.last_operation()
    }

    /// Every resolved operation, in completion order.
    pub fn operation_history(&self) -> Vec<OperationRecord> {
        self.interceptor.operation_history()
    }

    /// Whether a ceremony is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.interceptor.is_pending()
    }

    /// Forget all resolved operations.
    pub fn clear_history(&self) {
        self.interceptor.clear_history()
    }

    /// Wait for a successful registration specifically.
    pub async fn wait_for_registration(
        &self,
        timeout: Duration,
    ) -> Result<OperationRecord, AdapterError> {
        self.wait_for_kind(OperationKind::Create, timeout).await
    }

    /// Wait for a successful authentication specifically.
    pub async fn wait_for_authentication(
        &self,
        timeout: Duration,
    ) -> Result<OperationRecord, AdapterError> {
        self.wait_for_kind(OperationKind::Get, timeout).await
    }

    async fn wait_for_kind(
        &self,
        expected: OperationKind,
        timeout: Duration,
    ) -> Result<OperationRecord, AdapterError> {
        let record = self
            .wait_for_operation(timeout)
            .await
            .ok_or(AdapterError::Timeout(timeout))?;
        if record.kind != expected {
            return Err(AdapterError::WrongOperation {
                expected,
                actual: record.kind,
            });
        }
        if !record.success {
            return Err(AdapterError::Failed {
                kind: record.kind,
                message: record
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown ceremony failure".into()),
            });
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::{StubProvider, creation_options, request_options};

    impl CapabilityProbe for StubProvider {}

    #[tokio::test]
    async fn probes_default_to_false() {
        let adapter = ExternalAuthenticatorAdapter::new(StubProvider::succeeding());
        assert!(!adapter.webauthn_available());
        assert!(!adapter.platform_authenticator_available());
        assert!(!adapter.conditional_mediation_available());
    }

    #[tokio::test]
    async fn typed_waiter_validates_the_operation_kind() {
        let adapter = ExternalAuthenticatorAdapter::new(StubProvider::succeeding());
        let origin = Url::parse("https://wallet.keyfold.dev").expect("valid url");

        adapter
            .get(&origin, request_options(None))
            .await
            .expect("get succeeds");

        let err = adapter
            .wait_for_registration(Duration::from_millis(50))
            .await
            .expect_err("a get resolved, not a create");
        assert!(matches!(
            err,
            AdapterError::WrongOperation {
                expected: OperationKind::Create,
                actual: OperationKind::Get,
            }
        ));
    }

    #[tokio::test]
    async fn typed_waiter_reports_failures_descriptively() {
        let adapter = ExternalAuthenticatorAdapter::new(StubProvider::failing());
        let origin = Url::parse("https://wallet.keyfold.dev").expect("valid url");

        let _ = adapter.create(&origin, creation_options(None)).await;
        let err = adapter
            .wait_for_registration(Duration::from_millis(50))
            .await
            .expect_err("the create failed");
        assert!(matches!(err, AdapterError::Failed { kind: OperationKind::Create, .. }));
    }

    #[tokio::test]
    async fn typed_waiter_times_out() {
        let adapter = ExternalAuthenticatorAdapter::new(StubProvider::succeeding());
        let err = adapter
            .wait_for_authentication(Duration::from_millis(50))
            .await
            .expect_err("nothing resolves");
        assert!(matches!(err, AdapterError::Timeout(_)));
    }
}
