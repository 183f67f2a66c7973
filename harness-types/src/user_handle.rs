//! Decoding of the wallet backend's tenant-scoped user handles.
//!
//! The backend packs `(tenant, user)` into the WebAuthn `user.id` field, in
//! one of two encodings:
//!
//! * legacy text: the UTF-8 bytes of `"<tenantId>:<uuid>"`, split on the
//!   first colon only, so a user id may itself contain colons;
//! * versioned binary: exactly 25 bytes, a `0x01` version byte followed by
//!   8 bytes of tenant hash and the 16 raw bytes of the user's UUID.
//!
//! This module only consumes handles for assertions. Producing the binary
//! form is the backend's job.

use uuid::Uuid;

use crate::encoding::{self, DecodeError};

/// Version byte of the binary handle format.
pub const BINARY_VERSION_V1: u8 = 0x01;

/// Total length of a v1 binary handle: version + tenant hash + UUID.
pub const BINARY_V1_LEN: usize = 25;

/// A user handle decoded into its tenant scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantUserHandle {
    /// The legacy `"<tenantId>:<userId>"` text form.
    Text {
        /// Everything before the first colon.
        tenant_id: String,
        /// Everything after the first colon, further colons included.
        user_id: String,
    },
    /// The fixed-width binary form.
    BinaryV1 {
        /// 8-byte hash of the tenant id.
        tenant_hash: [u8; 8],
        /// The user's UUID.
        user_id: Uuid,
    },
}

impl TenantUserHandle {
    /// Decode a base64url-encoded user handle.
    ///
    /// `Ok(None)` means the handle decoded but is not tenant scoped (a bare
    /// uuid, or any text without a colon), an expected and common case.
    /// Malformed base64url is the only error.
    pub fn decode(handle: &str) -> Result<Option<Self>, DecodeError> {
        Ok(Self::from_bytes(&encoding::from_base64url(handle)?))
    }

    /// Interpret raw user-handle bytes.
    ///
    /// Valid UTF-8 is always read as the text form; use
    /// [`TenantUserHandle::from_binary`] to force the binary interpretation.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::from_text(text),
            Err(_) => Self::from_binary(bytes),
        }
    }

    /// Split a textual handle on its first colon.
    ///
    /// Tenant ids are not validated to be colon-free here; that constraint
    /// lives with the backend's tenant admin API.
    pub fn from_text(text: &str) -> Option<Self> {
        let (tenant_id, user_id) = text.split_once(':')?;
        Some(Self::Text {
            tenant_id: tenant_id.to_owned(),
            user_id: user_id.to_owned(),
        })
    }

    /// Interpret bytes as the v1 binary form, regardless of whether they
    /// also happen to be printable.
    pub fn from_binary(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != BINARY_V1_LEN || bytes[0] != BINARY_VERSION_V1 {
            return None;
        }
        let mut tenant_hash = [0u8; 8];
        tenant_hash.copy_from_slice(&bytes[1..9]);
        let user_id = Uuid::from_slice(&bytes[9..]).ok()?;
        Some(Self::BinaryV1 {
            tenant_hash,
            user_id,
        })
    }

    /// The tenant id, for handles in the text form.
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Self::Text { tenant_id, .. } => Some(tenant_id),
            Self::BinaryV1 { .. } => None,
        }
    }
}
