//! In-memory directory for development and tests.
//!
//! Accounts are declared in configuration:
//!
//! ```toml
//! [directory.implementations.memory.accounts."0.0.1001"]
//! key_type = "ED25519"
//! key = "302a300506032b6570032100..."
//! ```

use crate::{AccountRecord, DirectoryError, DirectoryInterface, RecordKey};
use async_trait::async_trait;
use login_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::collections::HashMap;

/// Directory answering lookups from a fixed account table.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
	accounts: HashMap<String, RecordKey>,
}

impl MemoryDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an account with the given key type and encoded key.
	pub fn with_account(
		mut self,
		account_id: impl Into<String>,
		key_type: impl Into<String>,
		key: impl Into<String>,
	) -> Self {
		self.accounts.insert(
			account_id.into(),
			RecordKey {
				key_type: key_type.into(),
				key: Some(key.into()),
			},
		);
		self
	}
}

#[async_trait]
impl DirectoryInterface for MemoryDirectory {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryDirectorySchema)
	}

	fn endpoint(&self) -> String {
		"memory://".to_string()
	}

	async fn lookup(&self, account_id: &str) -> Result<Vec<AccountRecord>, DirectoryError> {
		Ok(self
			.accounts
			.get_key_value(account_id)
			.map(|(account, key)| AccountRecord {
				account: account.clone(),
				key: Some(key.clone()),
			})
			.into_iter()
			.collect())
	}
}

/// Configuration schema for MemoryDirectory.
pub struct MemoryDirectorySchema;

impl ConfigSchema for MemoryDirectorySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("accounts", FieldType::Table).with_validator(|value| {
				let accounts = value.as_table().ok_or("accounts must be a table")?;
				for (id, entry) in accounts {
					let entry = entry
						.as_table()
						.ok_or_else(|| format!("account {} must be a table", id))?;
					if !entry.get("key_type").is_some_and(|v| v.is_str()) {
						return Err(format!("account {} needs a key_type string", id));
					}
					if entry.get("key").is_some_and(|v| !v.is_str()) {
						return Err(format!("account {} key must be a string", id));
					}
				}
				Ok(())
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a memory directory from configuration.
///
/// Configuration parameters:
/// - `accounts` (optional): table of account id to `{ key_type, key }`;
///   `key` may be omitted to model an account without key material
pub fn create_directory(
	config: &toml::Value,
) -> Result<Box<dyn DirectoryInterface>, DirectoryError> {
	MemoryDirectorySchema
		.validate(config)
		.map_err(|e| DirectoryError::Configuration(e.to_string()))?;

	let mut directory = MemoryDirectory::new();
	if let Some(accounts) = config.get("accounts").and_then(|v| v.as_table()) {
		for (id, entry) in accounts {
			let key_type = entry
				.get("key_type")
				.and_then(|v| v.as_str())
				.unwrap_or_default()
				.to_string();
			let key = entry.get("key").and_then(|v| v.as_str()).map(str::to_string);
			directory
				.accounts
				.insert(id.clone(), RecordKey { key_type, key });
		}
	}

	Ok(Box::new(directory))
}

/// Registry for the memory directory implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::DirectoryFactory;

	fn factory() -> Self::Factory {
		create_directory
	}
}

impl crate::DirectoryRegistry for Registry {}
