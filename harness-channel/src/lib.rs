//! # Harness Channel
//!
//! The out-of-band automation channel through which tests manage virtual
//! authenticators: a framed packet protocol carrying CBOR-encoded lifecycle
//! commands over an in-process byte pipe, a host task that executes them
//! against its authenticator registry, and the
//! [`VirtualAuthenticatorEnvironment`] controller the test fixtures hold.
//!
//! The channel intentionally lives outside the ceremony path, the way a
//! browser automation protocol manages devices outside the page's own
//! script context. Commands are serialized by the channel itself: there is
//! exactly one in flight at a time, which is what makes credential-store
//! mutations race free.

mod command;
mod environment;
mod framing;
mod host;

pub use command::{AuthenticatorId, CredentialSummary};
pub use environment::{ChannelError, SharedAuthenticator, VirtualAuthenticatorEnvironment};
pub use framing::FramingError;
pub use host::HostAuthenticator;
