//! # Harness Types
//!
//! Shared type definitions for the wallet end-to-end harness: the WebAuthn
//! structures exchanged with the ceremony layer, the CTAP2 structures spoken
//! to the software authenticator, the wallet backend's tagged binary wire
//! convention, and the tenant-scoped user handle format.

mod utils;

pub mod ctap2;
pub mod user_handle;
pub mod webauthn;

mod passkey;

// Re-exports
pub use passkey::{CredentialExtensions, Passkey, StoredHmacSecret};
pub use utils::{
    bytes::{Bytes, TaggedBytes},
    crypto, encoding,
    encoding::DecodeError,
    rand,
};
