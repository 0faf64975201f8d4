//! Account directory module for the login server.
//!
//! Resolves an account identifier to the public key that currently controls
//! it. Implementations fetch raw records from a ledger-indexing service; the
//! [`DirectoryService`] checks the shape of what came back before any key is
//! handed to signature verification.

use async_trait::async_trait;
use login_types::{AccountKey, AccountKeyInfo, ConfigSchema, ImplementationRegistry, KeyType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod mirror_node;
}

/// Errors that can occur while resolving an account.
#[derive(Debug, Error)]
pub enum DirectoryError {
	/// No record matches the requested account identifier.
	#[error("Account not found: {0}")]
	NotFound(String),
	/// A record matches but carries no key material.
	#[error("Account {0} has no key")]
	MissingKey(String),
	/// The record's key type is not one of the supported algorithms.
	#[error("Account {account_id} has unsupported key type '{key_type}'")]
	UnsupportedKeyType { account_id: String, key_type: String },
	/// The directory could not be reached or answered with an error status.
	#[error("Transport error: {0}")]
	Transport(#[from] reqwest::Error),
	/// The directory answered with a body that does not have the expected shape.
	#[error("Invalid directory response: {0}")]
	InvalidResponse(String),
	/// Error that occurs when the implementation config is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Key material attached to a directory record, as the directory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKey {
	#[serde(rename = "_type")]
	pub key_type: String,
	#[serde(default)]
	pub key: Option<String>,
}

/// One account record returned by a directory lookup.
///
/// Only the identifier and the key are read; any other field the directory
/// sends is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
	pub account: String,
	#[serde(default)]
	pub key: Option<RecordKey>,
}

/// Trait defining the interface for account directory backends.
#[async_trait]
pub trait DirectoryInterface: Send + Sync {
	/// Returns the configuration schema for this directory implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Base location of the backing service.
	fn endpoint(&self) -> String;

	/// Fetches the records the backend associates with `account_id`.
	///
	/// Backends return what they found without filtering; a backend may
	/// match on aliases or prefixes and return records for other accounts.
	async fn lookup(&self, account_id: &str) -> Result<Vec<AccountRecord>, DirectoryError>;
}

/// Type alias for directory factory functions.
pub type DirectoryFactory =
	fn(&toml::Value) -> Result<Box<dyn DirectoryInterface>, DirectoryError>;

/// Registry trait for directory implementations.
pub trait DirectoryRegistry: ImplementationRegistry<Factory = DirectoryFactory> {}

/// Get all registered directory implementations.
pub fn get_all_implementations() -> Vec<(&'static str, DirectoryFactory)> {
	use implementations::{memory, mirror_node};

	vec![
		(mirror_node::Registry::NAME, mirror_node::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Service resolving account identifiers to validated key information.
pub struct DirectoryService {
	implementation: Box<dyn DirectoryInterface>,
}

impl DirectoryService {
	pub fn new(implementation: Box<dyn DirectoryInterface>) -> Self {
		Self { implementation }
	}

	/// Base location of the configured backend.
	pub fn endpoint(&self) -> String {
		self.implementation.endpoint()
	}

	/// Resolves `account_id` to its current key.
	///
	/// Checks, in order: the backend returned at least one record; a record's
	/// own identifier equals `account_id` exactly; that record carries a
	/// non-empty key; the key type is one the login flow can verify.
	/// One backend call per invocation, no caching and no retry.
	pub async fn resolve(&self, account_id: &str) -> Result<AccountKeyInfo, DirectoryError> {
		let records = self.implementation.lookup(account_id).await?;
		if records.is_empty() {
			return Err(DirectoryError::NotFound(account_id.to_string()));
		}

		let record = records
			.into_iter()
			.find(|record| record.account == account_id)
			.ok_or_else(|| DirectoryError::NotFound(account_id.to_string()))?;

		let (key_type, key) = match record.key {
			Some(RecordKey {
				key_type,
				key: Some(key),
			}) if !key.is_empty() => (key_type, key),
			_ => return Err(DirectoryError::MissingKey(account_id.to_string())),
		};

		let key_type = key_type
			.parse::<KeyType>()
			.map_err(|e| DirectoryError::UnsupportedKeyType {
				account_id: account_id.to_string(),
				key_type: e.0,
			})?;

		tracing::debug!(account_id, %key_type, "Resolved account key");

		Ok(AccountKeyInfo {
			account_id: account_id.to_string(),
			key: AccountKey { key_type, key },
		})
	}
}
