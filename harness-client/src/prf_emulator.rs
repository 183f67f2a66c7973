use std::collections::HashMap;
use std::sync::Mutex;

use harness_types::{
    Bytes,
    crypto::{hmac_sha256, sha256},
    encoding,
    webauthn::{AuthenticationExtensionsPrfInputs, AuthenticationExtensionsPrfValues},
};

/// Deterministic stand-in for an authenticator's PRF.
///
/// Some virtual devices advertise the PRF extension without ever producing
/// outputs; the wallet frontend still derives its encryption keys from
/// them. This engine fills the gap: a per-credential seed derived from the
/// credential id, HMAC'd with whatever salt the caller supplies, so a
/// `get` reproduces exactly the key material the `create` established.
///
/// The seed derivation is keyed by a fixed, public prefix. Outputs are
/// reproducible across runs and secret in no sense whatsoever; do not reuse
/// this scheme outside a test double.
#[derive(Debug, Default)]
pub struct PrfEmulator {
    seeds: Mutex<HashMap<Bytes, [u8; 32]>>,
}

/// Domain separation prefix of the seed derivation.
const SEED_PREFIX: &[u8] = b"harness-prf-seed:";

impl PrfEmulator {
    /// An emulator with an empty seed cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The seed for a credential: `SHA-256(prefix || credential_id)`,
    /// cached so repeated ceremonies on one credential are O(1).
    pub fn seed_for(&self, credential_id: &[u8]) -> [u8; 32] {
        let key: Bytes = credential_id.into();
        let mut seeds = self.seeds.lock().expect("prf seed cache lock poisoned");
        *seeds.entry(key).or_insert_with(|| {
            let mut message = Vec::with_capacity(SEED_PREFIX.len() + credential_id.len());
            message.extend_from_slice(SEED_PREFIX);
            message.extend_from_slice(credential_id);
            sha256(&message)
        })
    }

    /// One PRF output: `HMAC-SHA256(key = seed, message = salt)`.
    pub fn output(seed: &[u8; 32], salt: &[u8]) -> [u8; 32] {
        hmac_sha256(seed, salt)
    }

    /// Evaluate the extension inputs for the credential that was actually
    /// used: its `evalByCredential` entry wins over the shared `eval`.
    pub fn evaluate(
        &self,
        credential_id: &[u8],
        inputs: &AuthenticationExtensionsPrfInputs,
    ) -> Option<AuthenticationExtensionsPrfValues> {
        let by_credential = inputs
            .eval_by_credential
            .as_ref()
            .and_then(|record| record.get(&encoding::base64url(credential_id)));
        let salts = by_credential.or(inputs.eval.as_ref())?;

        let seed = self.seed_for(credential_id);
        Some(AuthenticationExtensionsPrfValues {
            first: Self::output(&seed, &salts.first).into(),
            second: salts
                .second
                .as_ref()
                .map(|salt| Self::output(&seed, salt).into()),
        })
    }
}
