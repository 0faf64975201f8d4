//! Core of the login server: the server-signs-first handshake.
//!
//! [`SignatureService`] creates signing envelopes and verifies client
//! counter-signatures. [`LoginBuilder`] wires it with the configured signer
//! and account directory into a [`LoginEngine`].

pub mod builder;
pub mod engine;
pub mod observer;
pub mod signature;

pub use builder::{BuilderError, LoginBuilder, LoginFactories};
pub use engine::LoginEngine;
pub use observer::{NoopObserver, TracingObserver, VerificationObserver};
pub use signature::{SignatureError, SignatureService};
