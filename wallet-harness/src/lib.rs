//! # Wallet Harness
//!
//! End-to-end test harness for a multi-tenant WebAuthn wallet: a software
//! authenticator stack, a ceremony layer with operation tracking and
//! deterministic PRF emulation, an automation channel for authenticator
//! lifecycle management, backend flow orchestration, and mock renditions of
//! the wallet's auxiliary services. It is comprised of four sub-libraries
//! plus the mock services:
//!
//! - `harness-types`, type definitions usable as [`types`]: the WebAuthn
//!   and CTAP2 structures, the backend's tagged binary wire format, and the
//!   tenant user-handle codec.
//! - `harness-authenticator`, a software CTAP2 authenticator usable as
//!   [`authenticator`], with harness-controllable capabilities.
//! - `harness-channel`, the out-of-band automation channel usable as
//!   [`channel`], for adding, inspecting and removing virtual devices.
//! - `harness-client`, the ceremony layer usable as [`client`]: the
//!   [`CeremonyProvider`](client::CeremonyProvider) plug point, the
//!   [`CeremonyInterceptor`](client::CeremonyInterceptor) decorator, and
//!   the [`BackendClient`](client::BackendClient) flow driver.
//! - [`mock`], static-JSON axum responders standing in for the wallet's
//!   OpenID4VCI issuer, OpenID4VP verifier and AuthZEN policy decision
//!   point.
//!
//! The end-to-end scenarios live in this crate's `tests/` directory; they
//! wire a [`channel::VirtualAuthenticatorEnvironment`] to a
//! [`client::BackendClient`] against an in-process backend stand-in.

pub mod mock;

pub use harness_authenticator as authenticator;
pub use harness_channel as channel;
pub use harness_client as client;
pub use harness_types as types;
