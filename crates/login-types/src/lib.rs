//! Common types module for the login handshake system.
//!
//! This module defines the data model shared by every crate in the workspace:
//! the payloads exchanged with wallet clients, directory results, the
//! canonical encoder both signatures are computed over, and the small
//! configuration-validation framework used by pluggable implementations.

/// Account and key types returned by directory lookups.
pub mod account;
/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Deterministic JSON encoding used as the input to every signature.
pub mod canonical;
/// Verification events emitted through the observability hook.
pub mod events;
/// Payload and envelope types exchanged with clients.
pub mod payload;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string type for private key material.
pub mod secret_string;
/// Configuration validation types for implementation configs.
pub mod validation;

pub use account::*;
pub use api::*;
pub use canonical::{canonicalize, CanonicalError, Canonicalizable};
pub use events::*;
pub use payload::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use validation::*;
