//! Signer backed by a private key held in process memory.
//!
//! The key is read from configuration once and never changes afterwards.

use crate::{PrivateKey, PublicKey, SignerError, SignerInterface};
use login_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, KeyType, Schema, SecretString,
	ValidationError,
};

/// Signer holding a local key pair.
pub struct LocalSigner {
	private_key: PrivateKey,
	public_key: PublicKey,
}

impl LocalSigner {
	/// Creates a signer from an already-parsed key.
	pub fn new(private_key: PrivateKey) -> Self {
		let public_key = private_key.public_key();
		Self {
			private_key,
			public_key,
		}
	}

	/// Creates a signer from a key string, optionally forcing the key type.
	pub fn from_secret(
		secret: &SecretString,
		key_type: Option<KeyType>,
	) -> Result<Self, SignerError> {
		let private_key = secret.with_exposed(|s| match key_type {
			Some(key_type) => PrivateKey::from_str_typed(s, key_type),
			None => s.parse(),
		})?;
		Ok(Self::new(private_key))
	}
}

impl SignerInterface for LocalSigner {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalSignerSchema)
	}

	fn key_type(&self) -> KeyType {
		self.private_key.key_type()
	}

	fn public_key(&self) -> PublicKey {
		self.public_key.clone()
	}

	fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
		Ok(self.private_key.sign(message))
	}
}

/// Configuration schema for LocalSigner.
pub struct LocalSignerSchema;

impl ConfigSchema for LocalSignerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("private_key", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(s) if !s.trim().is_empty() => Ok(()),
					_ => Err("private_key cannot be empty".to_string()),
				}
			})],
			vec![Field::new("key_type", FieldType::String).with_validator(|value| {
				value
					.as_str()
					.unwrap_or_default()
					.parse::<KeyType>()
					.map(|_| ())
					.map_err(|e| e.to_string())
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a local signer from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex key string, raw or DER
/// - `key_type` (optional): `"ED25519"` or `"ECDSA"`, skips encoding detection
pub fn create_signer(config: &toml::Value) -> Result<Box<dyn SignerInterface>, SignerError> {
	LocalSignerSchema
		.validate(config)
		.map_err(|e| SignerError::Configuration(e.to_string()))?;

	let secret = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| SignerError::Configuration("private_key is required".into()))?;

	let key_type = config
		.get("key_type")
		.and_then(|v| v.as_str())
		.map(|s| s.parse::<KeyType>())
		.transpose()
		.map_err(|e| SignerError::Configuration(e.to_string()))?;

	Ok(Box::new(LocalSigner::from_secret(&secret, key_type)?))
}

/// Registry for the local signer implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::SignerFactory;

	fn factory() -> Self::Factory {
		create_signer
	}
}

impl crate::SignerRegistry for Registry {}
