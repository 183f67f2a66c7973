use harness_types::{
    ctap2::get_info,
    webauthn::AuthenticatorTransport,
};
use serde::{Deserialize, Serialize};

/// Capability switches for a virtual authenticator.
///
/// These mirror the knobs the automation channel accepts when adding an
/// authenticator, so every test declares exactly the device it needs. The
/// default favours the wallet's registration requirements: a platform
/// authenticator with resident keys, user verification and PRF support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticatorCapabilities {
    /// Protocol version the device reports.
    pub protocol: CtapVersion,

    /// Transport the device claims to be reachable over.
    pub transport: AuthenticatorTransport,

    /// Whether discoverable (resident) credentials can be stored.
    pub has_resident_key: bool,

    /// Whether the device can verify the user at all.
    pub has_user_verification: bool,

    /// The initial outcome of user verification attempts; tests flip this
    /// through the channel to simulate UV failures.
    pub is_user_verified: bool,

    /// Whether the hmac-secret/PRF extension is available.
    pub supports_prf: bool,

    /// Whether the largeBlob extension is advertised. Recognized for
    /// configuration parity; no wallet flow exercises it.
    pub supports_large_blob: bool,

    /// Whether the credBlob extension is advertised. Recognized for
    /// configuration parity; no wallet flow exercises it.
    pub supports_cred_blob: bool,

    /// Whether the minPinLength extension is advertised. Recognized for
    /// configuration parity; no wallet flow exercises it.
    pub supports_min_pin_length: bool,

    /// Initial backup eligibility flag on produced authenticator data.
    pub backup_eligible: bool,

    /// Initial backup state flag on produced authenticator data.
    pub backup_state: bool,

    /// Whether new credentials carry a signature counter.
    pub with_signature_counter: bool,
}

impl Default for AuthenticatorCapabilities {
    fn default() -> Self {
        Self::platform()
    }
}

impl AuthenticatorCapabilities {
    /// A platform authenticator: internal transport, resident keys, user
    /// verification and PRF.
    pub const fn platform() -> Self {
        Self {
            protocol: CtapVersion::Ctap2_1,
            transport: AuthenticatorTransport::Internal,
            has_resident_key: true,
            has_user_verification: true,
            is_user_verified: true,
            supports_prf: true,
            supports_large_blob: false,
            supports_cred_blob: false,
            supports_min_pin_length: false,
            backup_eligible: true,
            backup_state: true,
            with_signature_counter: false,
        }
    }

    /// A roaming security key on USB, with the full capability set.
    pub fn security_key() -> Self {
        Self {
            transport: AuthenticatorTransport::Usb,
            backup_eligible: false,
            backup_state: false,
            with_signature_counter: true,
            ..Self::platform()
        }
    }

    /// A platform authenticator with PRF explicitly disabled, for negative
    /// testing of the wallet's key-derivation path.
    pub fn without_prf() -> Self {
        Self {
            supports_prf: false,
            ..Self::platform()
        }
    }

    pub(crate) fn get_info_version(&self) -> get_info::Version {
        match self.protocol {
            CtapVersion::Ctap2_0 => get_info::Version::Fido2_0,
            CtapVersion::Ctap2_1 => get_info::Version::Fido2_1,
            CtapVersion::U2f => get_info::Version::U2fV2,
        }
    }
}

/// Protocol versions a virtual authenticator can present as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtapVersion {
    /// CTAP 2.0.
    #[serde(rename = "ctap2")]
    Ctap2_0,
    /// CTAP 2.1.
    #[serde(rename = "ctap2_1")]
    Ctap2_1,
    /// The legacy U2F protocol.
    U2f,
}
