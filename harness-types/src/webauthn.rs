//! The subset of the [WebAuthn] data model exercised by the wallet's
//! registration and login flows.
//!
//! [WebAuthn]: https://w3c.github.io/webauthn/

mod assertion;
mod attestation;
mod common;
mod extensions;

pub use self::{assertion::*, attestation::*, common::*, extensions::*};
