use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use harness_types::{
    Bytes,
    webauthn::{
        AuthenticatedPublicKeyCredential, AuthenticationExtensionsClientOutputs,
        AuthenticationExtensionsPrfInputs, AuthenticationExtensionsPrfOutputs,
        CreatedPublicKeyCredential, CredentialCreationOptions, CredentialRequestOptions,
    },
};
use tokio::sync::watch;
use url::Url;

use crate::{CeremonyProvider, PrfEmulator, WebauthnError};

/// Which credential entry point an operation went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A creation ceremony.
    Create,
    /// A retrieval ceremony.
    Get,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Get => f.write_str("get"),
        }
    }
}

/// One intercepted ceremony, success or failure.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    /// Whether this was a `create` or a `get`.
    pub kind: OperationKind,
    /// When the ceremony was issued.
    pub started_at: Instant,
    /// When the ceremony resolved.
    pub finished_at: Instant,
    /// Whether the ceremony succeeded.
    pub success: bool,
    /// The resulting credential id, on success.
    pub credential_id: Option<Bytes>,
    /// The resulting user handle, for successful retrievals.
    pub user_handle: Option<Bytes>,
    /// The stringified error, on failure.
    pub error: Option<String>,
    /// Whether a PRF output was present on the result, emulated or native.
    pub prf_attached: bool,
}

impl OperationRecord {
    /// How long the ceremony took.
    pub fn duration(&self) -> Duration {
        self.finished_at.duration_since(self.started_at)
    }
}

#[derive(Default)]
struct TrackerState {
    history: Vec<OperationRecord>,
    pending: bool,
}

/// Decorates a [`CeremonyProvider`] with operation tracking and PRF
/// emulation.
///
/// Call semantics are preserved exactly: the inner provider's result (or
/// error) is what the caller sees, with one exception: when a PRF
/// extension was requested and the inner provider produced no PRF results,
/// the [`PrfEmulator`]'s deterministic output is spliced into the client
/// extension results. No other field is touched.
///
/// At most one ceremony may be pending at a time; the browser serializes
/// WebAuthn ceremonies per page and this layer enforces the same rule. A
/// ceremony that resolves after a waiter already timed out still lands in
/// the history without disturbing anything else.
pub struct CeremonyInterceptor<P> {
    inner: P,
    emulator: PrfEmulator,
    state: Mutex<TrackerState>,
    completions: watch::Sender<u64>,
}

impl<P> CeremonyInterceptor<P> {
    /// Wrap a provider. Install the interceptor before handing the provider
    /// to any application code, otherwise early ceremonies bypass it.
    pub fn new(inner: P) -> Self {
        let (completions, _) = watch::channel(0);
        Self {
            inner,
            emulator: PrfEmulator::new(),
            state: Mutex::new(TrackerState::default()),
            completions,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The PRF emulator used for splicing.
    pub fn emulator(&self) -> &PrfEmulator {
        &self.emulator
    }

    /// The most recently resolved operation.
    pub fn last_operation(&self) -> Option<OperationRecord> {
        self.lock_state().history.last().cloned()
    }

    /// Every resolved operation, in completion order.
    pub fn operation_history(&self) -> Vec<OperationRecord> {
        self.lock_state().history.clone()
    }

    /// Whether a ceremony is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.lock_state().pending
    }

    /// Forget all resolved operations. Called by fixtures between test
    /// steps; a pending ceremony is unaffected.
    pub fn clear_history(&self) {
        self.lock_state().history.clear();
    }

    /// Wait until an operation has resolved, up to `timeout`.
    ///
    /// Resolves to `None` on timeout: "still pending or abandoned" is not
    /// an error, and is deliberately distinct from a ceremony failure,
    /// which shows up as a record with `success: false`.
    pub async fn wait_for_operation(&self, timeout: Duration) -> Option<OperationRecord> {
        let mut completions = self.completions.subscribe();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let state = self.lock_state();
                if !state.pending {
                    if let Some(last) = state.history.last() {
                        return Some(last.clone());
                    }
                }
            }
            match tokio::time::timeout_at(deadline, completions.changed()).await {
                Ok(Ok(())) => continue,
                // Timeout, or the tracker itself went away.
                _ => return None,
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().expect("operation tracker lock poisoned")
    }

    fn begin(&self) -> Result<(), WebauthnError> {
        let mut state = self.lock_state();
        if state.pending {
            return Err(WebauthnError::OperationPending);
        }
        state.pending = true;
        Ok(())
    }

    fn complete(&self, record: OperationRecord) {
        {
            let mut state = self.lock_state();
            state.pending = false;
            state.history.push(record);
        }
        self.completions.send_modify(|count| *count += 1);
    }

    /// Splice an emulated PRF output into `outputs` when the inner provider
    /// produced none. Returns whether the result now carries PRF values.
    fn patch_prf(
        &self,
        requested: Option<&AuthenticationExtensionsPrfInputs>,
        credential_id: &[u8],
        outputs: &mut AuthenticationExtensionsClientOutputs,
        is_creation: bool,
    ) -> bool {
        let Some(requested) = requested else {
            return outputs
                .prf
                .as_ref()
                .is_some_and(|prf| prf.results.is_some());
        };

        let native = outputs.prf.as_ref().is_some_and(|prf| prf.results.is_some());
        if native {
            return true;
        }

        match self.emulator.evaluate(credential_id, requested) {
            Some(results) => {
                outputs.prf = Some(AuthenticationExtensionsPrfOutputs {
                    enabled: is_creation.then_some(true),
                    results: Some(results),
                });
                true
            }
            None => {
                // PRF was requested without salts; a creation still reports
                // that the PRF is available for later use.
                if is_creation && outputs.prf.is_none() {
                    outputs.prf = Some(AuthenticationExtensionsPrfOutputs {
                        enabled: Some(true),
                        results: None,
                    });
                }
                false
            }
        }
    }
}

#[async_trait]
impl<P: CeremonyProvider> CeremonyProvider for CeremonyInterceptor<P> {
    async fn create(
        &self,
        origin: &Url,
        options: CredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, WebauthnError> {
        self.begin()?;
        let started_at = Instant::now();
        let prf_request = options
            .public_key
            .extensions
            .as_ref()
            .and_then(|ext| ext.prf.clone());

        match self.inner.create(origin, options).await {
            Ok(mut credential) => {
                let prf_attached = self.patch_prf(
                    prf_request.as_ref(),
                    &credential.raw_id,
                    &mut credential.client_extension_results,
                    true,
                );
                self.complete(OperationRecord {
                    kind: OperationKind::Create,
                    started_at,
                    finished_at: Instant::now(),
                    success: true,
                    credential_id: Some(credential.raw_id.clone()),
                    user_handle: None,
                    error: None,
                    prf_attached,
                });
                Ok(credential)
            }
            Err(err) => {
                self.complete(OperationRecord {
                    kind: OperationKind::Create,
                    started_at,
                    finished_at: Instant::now(),
                    success: false,
                    credential_id: None,
                    user_handle: None,
                    error: Some(err.to_string()),
                    prf_attached: false,
                });
                Err(err)
            }
        }
    }

    async fn get(
        &self,
        origin: &Url,
        options: CredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, WebauthnError> {
        self.begin()?;
        let started_at = Instant::now();
        let prf_request = options
            .public_key
            .extensions
            .as_ref()
            .and_then(|ext| ext.prf.clone());

        match self.inner.get(origin, options).await {
            Ok(mut credential) => {
                let prf_attached = self.patch_prf(
                    prf_request.as_ref(),
                    &credential.raw_id,
                    &mut credential.client_extension_results,
                    false,
                );
                self.complete(OperationRecord {
                    kind: OperationKind::Get,
                    started_at,
                    finished_at: Instant::now(),
                    success: true,
                    credential_id: Some(credential.raw_id.clone()),
                    user_handle: credential.response.user_handle.clone(),
                    error: None,
                    prf_attached,
                });
                Ok(credential)
            }
            Err(err) => {
                self.complete(OperationRecord {
                    kind: OperationKind::Get,
                    started_at,
                    finished_at: Instant::now(),
                    success: false,
                    credential_id: None,
                    user_handle: None,
                    error: Some(err.to_string()),
                    prf_attached: false,
                });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use harness_types::webauthn;

    use super::*;
    use crate::tests_support::{StubProvider, creation_options, request_options};

    #[tokio::test]
    async fn records_operations_in_completion_order() {
        let interceptor = CeremonyInterceptor::new(StubProvider::succeeding());
        let origin = Url::parse("https://wallet.keyfold.dev").expect("valid url");

        interceptor
            .create(&origin, creation_options(None))
            .await
            .expect("create succeeds");
        interceptor
            .get(&origin, request_options(None))
            .await
            .expect("get succeeds");

        let history = interceptor.operation_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, OperationKind::Create);
        assert_eq!(history[1].kind, OperationKind::Get);
        assert!(history.iter().all(|record| record.success));
    }

    #[tokio::test]
    async fn failures_are_recorded_and_rethrown() {
        let interceptor = CeremonyInterceptor::new(StubProvider::failing());
        let origin = Url::parse("https://wallet.keyfold.dev").expect("valid url");

        let err = interceptor
            .create(&origin, creation_options(None))
            .await
            .expect_err("stub fails");
        assert_eq!(err, WebauthnError::CredentialNotFound);

        let last = interceptor.last_operation().expect("recorded");
        assert!(!last.success);
        assert_eq!(last.error.as_deref(), Some("no credential was found"));
        assert!(!interceptor.is_pending());
    }

    #[tokio::test]
    async fn splices_emulated_prf_outputs() {
        let interceptor = CeremonyInterceptor::new(StubProvider::succeeding());
        let origin = Url::parse("https://wallet.keyfold.dev").expect("valid url");

        let prf = AuthenticationExtensionsPrfInputs {
            eval: Some(webauthn::AuthenticationExtensionsPrfValues {
                first: b"vault-key".as_slice().into(),
                second: None,
            }),
            eval_by_credential: None,
        };

        let created = interceptor
            .create(&origin, creation_options(Some(prf.clone())))
            .await
            .expect("create succeeds");
        let create_prf = created
            .client_extension_results
            .prf
            .expect("prf output spliced");
        assert_eq!(create_prf.enabled, Some(true));
        let create_results = create_prf.results.expect("results spliced");

        // A later `get` on the same credential reproduces the same output.
        let got = interceptor
            .get(&origin, request_options(Some(prf)))
            .await
            .expect("get succeeds");
        let get_results = got
            .client_extension_results
            .prf
            .expect("prf output spliced")
            .results
            .expect("results spliced");
        assert_eq!(create_results, get_results);

        assert!(interceptor.last_operation().expect("recorded").prf_attached);
    }

    #[tokio::test]
    async fn wait_times_out_to_none_quickly() {
        let interceptor = CeremonyInterceptor::new(StubProvider::succeeding());
        // Nothing is pending and nothing ever resolves.
        let started = Instant::now();
        let waited = interceptor
            .wait_for_operation(Duration::from_millis(50))
            .await;
        assert!(waited.is_none());
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_millis(45) && elapsed < Duration::from_millis(500),
            "timeout should resolve near the requested 50ms, took {elapsed:?}",
        );
    }

    #[tokio::test]
    async fn wait_returns_the_resolved_operation() {
        let interceptor = CeremonyInterceptor::new(StubProvider::succeeding());
        let origin = Url::parse("https://wallet.keyfold.dev").expect("valid url");
        interceptor
            .create(&origin, creation_options(None))
            .await
            .expect("create succeeds");

        let record = interceptor
            .wait_for_operation(Duration::from_millis(50))
            .await
            .expect("already resolved");
        assert_eq!(record.kind, OperationKind::Create);
    }
}
