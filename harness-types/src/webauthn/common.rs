use serde::{Deserialize, Serialize};

use crate::Bytes;

/// The type of a public key credential. The only value the specification
/// currently knows is `public-key`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicKeyCredentialType {
    /// A WebAuthn public key credential.
    #[default]
    #[serde(rename = "public-key")]
    PublicKey,
}

/// Identifies a specific credential for allow and exclude lists.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialdescriptor>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialDescriptor {
    /// The type of the credential.
    #[serde(rename = "type")]
    pub ty: PublicKeyCredentialType,

    /// The credential id.
    pub id: Bytes,

    /// Hints on how the client might communicate with the authenticator
    /// holding this credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}

/// A Relying Party's requirements for user verification.
///
/// <https://w3c.github.io/webauthn/#enumdef-userverificationrequirement>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    /// The ceremony must fail without user verification.
    Required,
    /// User verification is preferred but the ceremony proceeds without it.
    #[default]
    Preferred,
    /// User verification should not be employed.
    Discouraged,
}

/// How an authenticator communicates with clients.
///
/// <https://w3c.github.io/webauthn/#enumdef-authenticatortransport>
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthenticatorTransport {
    /// Removable USB devices.
    Usb,
    /// Near field communication.
    Nfc,
    /// Bluetooth low energy.
    Ble,
    /// Cross-device flows over the hybrid (caBLE) transport.
    Hybrid,
    /// A client-device-specific transport; these are platform authenticators.
    Internal,
}

/// The attachment modality used by an authenticator.
///
/// <https://w3c.github.io/webauthn/#enumdef-authenticatorattachment>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorAttachment {
    /// Attached to the client device itself.
    Platform,
    /// A roaming authenticator, reachable over a cross-platform transport.
    CrossPlatform,
}

pub(crate) mod algorithm {
    //! Serde adapter for COSE algorithm identifiers, which appear on the
    //! wire as plain integers.

    use coset::iana::{self, EnumI64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(alg: &iana::Algorithm, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(alg.to_i64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<iana::Algorithm, D::Error> {
        let value = i64::deserialize(deserializer)?;
        iana::Algorithm::from_i64(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown COSE algorithm {value}")))
    }
}
