//! Representations of the [CTAP 2] structures the software authenticator
//! operates on, plus the authenticator-side extension inputs and outputs.
//!
//! These structs only ever travel in-process or over the harness's own
//! automation channel, so they are plain serde types; the byte-exact
//! encodings live where the specifications demand them (authenticator data,
//! attestation objects).
//!
//! [CTAP 2]: https://fidoalliance.org/specs/fido-v2.1-ps-20210615/fido-client-to-authenticator-protocol-v2.1-ps-errata-20220621.html

mod aaguid;
mod auth_data;
mod error;
mod flags;

pub mod extensions;
pub mod get_assertion;
pub mod get_info;
pub mod make_credential;

pub use self::{aaguid::*, auth_data::*, error::*, flags::*};
