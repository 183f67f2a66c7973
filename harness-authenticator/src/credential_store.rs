use harness_types::{
    Passkey,
    ctap2::{Ctap2Error, make_credential::PublicKeyCredentialRpEntity},
    webauthn::{PublicKeyCredentialDescriptor, PublicKeyCredentialUserEntity},
};

/// Storage plug point for the authenticator.
///
/// Besides the lookups the ceremonies need, this trait exposes the
/// enumeration and mutation surface the automation channel commands are
/// built on: tests inspect, delete and clear credentials between ceremonies.
#[async_trait::async_trait]
pub trait CredentialStore {
    /// Find credentials matching `ids`, or all discoverable credentials for
    /// the relying party when `ids` is `None`. The assertion ceremony uses
    /// the first returned credential.
    async fn find_credentials(
        &self,
        ids: Option<&[PublicKeyCredentialDescriptor]>,
        rp_id: &str,
    ) -> Result<Vec<Passkey>, Ctap2Error>;

    /// Save a freshly created credential.
    async fn save_credential(
        &mut self,
        cred: Passkey,
        user: PublicKeyCredentialUserEntity,
        rp: PublicKeyCredentialRpEntity,
    ) -> Result<(), Ctap2Error>;

    /// Persist an updated credential (e.g. a bumped signature counter).
    async fn update_credential(&mut self, cred: Passkey) -> Result<(), Ctap2Error>;

    /// Every credential currently stored, across relying parties.
    async fn all_credentials(&self) -> Vec<Passkey>;

    /// Remove one credential by id. Returns whether it existed.
    async fn delete_credential(&mut self, credential_id: &[u8]) -> bool;

    /// Remove every stored credential.
    async fn clear(&mut self);
}

/// In-memory credential store, insertion ordered.
///
/// This is what the virtual authenticator environment backs its devices
/// with; the insertion order makes "first credential wins" deterministic in
/// tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credentials: Vec<Passkey>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, credential_id: &[u8]) -> Option<usize> {
        self.credentials
            .iter()
            .position(|cred| cred.credential_id.as_slice() == credential_id)
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credentials(
        &self,
        ids: Option<&[PublicKeyCredentialDescriptor]>,
        rp_id: &str,
    ) -> Result<Vec<Passkey>, Ctap2Error> {
        let matches: Vec<Passkey> = match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|desc| {
                    self.credentials
                        .iter()
                        .find(|cred| cred.credential_id == desc.id && cred.rp_id == rp_id)
                })
                .cloned()
                .collect(),
            None => self
                .credentials
                .iter()
                .filter(|cred| cred.rp_id == rp_id && cred.user_handle.is_some())
                .cloned()
                .collect(),
        };

        if matches.is_empty() {
            Err(Ctap2Error::NoCredentials)
        } else {
            Ok(matches)
        }
    }

    async fn save_credential(
        &mut self,
        cred: Passkey,
        _user: PublicKeyCredentialUserEntity,
        _rp: PublicKeyCredentialRpEntity,
    ) -> Result<(), Ctap2Error> {
        self.credentials.push(cred);
        Ok(())
    }

    async fn update_credential(&mut self, cred: Passkey) -> Result<(), Ctap2Error> {
        match self.position(&cred.credential_id) {
            Some(idx) => {
                self.credentials[idx] = cred;
                Ok(())
            }
            None => Err(Ctap2Error::NoCredentials),
        }
    }

    async fn all_credentials(&self) -> Vec<Passkey> {
        self.credentials.clone()
    }

    async fn delete_credential(&mut self, credential_id: &[u8]) -> bool {
        match self.position(credential_id) {
            Some(idx) => {
                self.credentials.remove(idx);
                true
            }
            None => false,
        }
    }

    async fn clear(&mut self) {
        self.credentials.clear();
    }
}
