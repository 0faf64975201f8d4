//! Server key management for the login handshake.
//!
//! This crate owns the server's signing key. It defines the interface signer
//! implementations provide, and the key parsing and signature primitives
//! that are also used to check client signatures.

use login_types::{ConfigSchema, ImplementationRegistry, KeyType};
use thiserror::Error;

pub mod keys;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub use keys::{KeyError, PrivateKey, PublicKey};

/// Errors that can occur during signer operations.
#[derive(Debug, Error)]
pub enum SignerError {
	/// Error that occurs when the configured key cannot be parsed.
	#[error("Invalid key: {0}")]
	InvalidKey(#[from] KeyError),
	/// Error that occurs when the implementation config is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every server signer implements.
///
/// Signing is synchronous: it is pure computation over a key the signer
/// already holds.
pub trait SignerInterface: Send + Sync {
	/// Returns the configuration schema for this signer implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Algorithm of the held key.
	fn key_type(&self) -> KeyType;

	/// Public half of the held key.
	fn public_key(&self) -> PublicKey;

	/// Signs `message` with the held key.
	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;

	/// Checks a signature this signer produced against the held key's public
	/// half. ECDSA signatures must be low-S.
	fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
		self.public_key().verify_strict(message, signature)
	}
}

/// Type alias for signer factory functions.
pub type SignerFactory = fn(&toml::Value) -> Result<Box<dyn SignerInterface>, SignerError>;

/// Registry trait for signer implementations.
pub trait SignerRegistry: ImplementationRegistry<Factory = SignerFactory> {}

/// Get all registered signer implementations.
pub fn get_all_implementations() -> Vec<(&'static str, SignerFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}
