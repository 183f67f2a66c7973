//! The lifecycle commands the automation channel carries.

use harness_authenticator::AuthenticatorCapabilities;
use harness_types::{Bytes, webauthn::AuthenticatorTransport};
use serde::{Deserialize, Serialize};

/// Opaque handle of one virtual authenticator within an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticatorId(pub u32);

impl std::fmt::Display for AuthenticatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "authenticator-{}", self.0)
    }
}

/// A command sent from the controller to the channel host.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub(crate) enum ChannelRequest {
    /// Turn the environment on; required before anything else.
    EnableEnvironment,
    /// Create a virtual authenticator with the given capabilities.
    AddAuthenticator {
        capabilities: AuthenticatorCapabilities,
    },
    /// Tear one authenticator down.
    RemoveAuthenticator { authenticator: AuthenticatorId },
    /// Enumerate an authenticator's stored credentials.
    GetCredentials { authenticator: AuthenticatorId },
    /// Delete one stored credential.
    RemoveCredential {
        authenticator: AuthenticatorId,
        credential_id: Bytes,
    },
    /// Delete every stored credential.
    ClearCredentials { authenticator: AuthenticatorId },
    /// Set the outcome of subsequent user verification checks.
    SetUserVerified {
        authenticator: AuthenticatorId,
        verified: bool,
    },
    /// Turn the environment off, removing all authenticators.
    DisableEnvironment,
}

/// The host's reply to a [`ChannelRequest`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub(crate) enum ChannelResponse {
    /// The command succeeded with nothing to report.
    Ok,
    /// An authenticator was created.
    AuthenticatorAdded { authenticator: AuthenticatorId },
    /// The requested credential enumeration.
    Credentials { credentials: Vec<CredentialSummary> },
    /// A removal command completed; reports whether the target existed.
    Removed { existed: bool },
    /// The command failed.
    Error { message: String },
}

/// The public attributes of a stored credential, as exposed to tests.
///
/// Key material never crosses the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    /// The credential id.
    pub credential_id: Bytes,

    /// The Relying Party the credential is scoped to.
    pub rp_id: String,

    /// The user handle, for discoverable credentials.
    pub user_handle: Option<Bytes>,

    /// The current signature counter, when the device uses counters.
    pub counter: Option<u32>,

    /// Transports the holding authenticator reports.
    pub transports: Vec<AuthenticatorTransport>,
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).map_err(|err| err.to_string())?;
    Ok(out)
}

pub(crate) fn decode<T: for<'de> Deserialize<'de>>(payload: &[u8]) -> Result<T, String> {
    ciborium::de::from_reader(payload).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_survive_the_cbor_round_trip() {
        let request = ChannelRequest::RemoveCredential {
            authenticator: AuthenticatorId(3),
            credential_id: vec![1, 2, 3].into(),
        };
        let bytes = encode(&request).expect("encodable");
        let back: ChannelRequest = decode(&bytes).expect("decodable");
        assert!(matches!(
            back,
            ChannelRequest::RemoveCredential { authenticator: AuthenticatorId(3), .. }
        ));
    }
}
