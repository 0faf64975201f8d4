//! Builder pattern for constructing login engines.
//!
//! The signer and the directory are pluggable: each is created by the
//! factory registered under its configured `primary` name, and its TOML
//! table is then checked against the schema the implementation reports.

use crate::engine::LoginEngine;
use crate::observer::{NoopObserver, VerificationObserver};
use crate::signature::SignatureService;
use login_account::{SignerError, SignerInterface};
use login_config::{ComponentConfig, Config};
use login_directory::{DirectoryError, DirectoryInterface, DirectoryService};
use login_types::ConfigSchema;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct LoginFactories<SF, DF> {
	pub signer_factories: HashMap<String, SF>,
	pub directory_factories: HashMap<String, DF>,
}

impl
	LoginFactories<
		login_account::SignerFactory,
		login_directory::DirectoryFactory,
	>
{
	/// Every implementation shipped with the workspace.
	pub fn all() -> Self {
		Self {
			signer_factories: login_account::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			directory_factories: login_directory::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}
}

/// Builder for constructing a LoginEngine with pluggable implementations.
pub struct LoginBuilder {
	config: Config,
	observer: Arc<dyn VerificationObserver>,
}

impl LoginBuilder {
	/// Creates a new LoginBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			observer: Arc::new(NoopObserver),
		}
	}

	/// Installs the observer handed to the signature service.
	pub fn with_observer(mut self, observer: Arc<dyn VerificationObserver>) -> Self {
		self.observer = observer;
		self
	}

	/// Builds the engine from the configured primary implementations.
	pub fn build<SF, DF>(self, factories: LoginFactories<SF, DF>) -> Result<LoginEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn SignerInterface>, SignerError>,
		DF: Fn(&toml::Value) -> Result<Box<dyn DirectoryInterface>, DirectoryError>,
	{
		let signer = create_primary(
			"signer",
			&self.config.signer,
			&factories.signer_factories,
		)?;
		let directory = create_primary(
			"directory",
			&self.config.directory,
			&factories.directory_factories,
		)?;

		let directory = Arc::new(DirectoryService::new(directory));
		let signatures = SignatureService::new(signer, self.config.server.domain_url.clone())
			.with_directory_url(directory.endpoint())
			.with_observer(self.observer);

		tracing::info!(
			domain_url = %self.config.server.domain_url,
			directory = %directory.endpoint(),
			"Login engine ready"
		);

		Ok(LoginEngine::new(self.config, Arc::new(signatures), directory))
	}
}

/// A constructed component that can report its configuration schema.
trait Configurable {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

impl Configurable for Box<dyn SignerInterface> {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		(**self).config_schema()
	}
}

impl Configurable for Box<dyn DirectoryInterface> {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		(**self).config_schema()
	}
}

/// Creates the primary implementation of one component.
fn create_primary<F, T, E>(
	component: &str,
	config: &ComponentConfig,
	factories: &HashMap<String, F>,
) -> Result<T, BuilderError>
where
	F: Fn(&toml::Value) -> Result<T, E>,
	T: Configurable,
	E: Display,
{
	for name in config.implementations.keys() {
		if !factories.contains_key(name) {
			tracing::warn!(component, implementation = %name, "No factory registered, ignoring");
		}
	}

	let name = &config.primary;
	let factory = factories.get(name).ok_or_else(|| {
		BuilderError::MissingComponent(format!("{} implementation '{}'", component, name))
	})?;
	let implementation_config = config.primary_config().ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' has no configuration",
			component, name
		))
	})?;

	match factory(implementation_config) {
		Ok(implementation) => {
			// Validate the configuration using the implementation's schema
			if let Err(e) = implementation.config_schema().validate(implementation_config) {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Invalid configuration for implementation"
				);
				return Err(BuilderError::Config(format!(
					"Invalid configuration for {} implementation '{}': {}",
					component, name, e
				)));
			}
			tracing::info!(component, implementation = %name, "Loaded");
			Ok(implementation)
		},
		Err(e) => {
			tracing::error!(
				component,
				implementation = %name,
				error = %e,
				"Failed to create implementation"
			);
			Err(BuilderError::Config(format!(
				"Failed to create {} implementation '{}': {}",
				component, name, e
			)))
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use login_directory::implementations::memory::MemoryDirectory;
	use std::str::FromStr;

	const SERVER_SEED: &str = "db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10";

	fn config(signer: &str, directory: &str) -> Config {
		Config::from_str(&format!(
			r#"
[server]
domain_url = "https://app.example.com"

[signer]
primary = "local"
[signer.implementations.local]
{signer}

[directory]
primary = "memory"
[directory.implementations.memory]
{directory}
"#
		))
		.unwrap()
	}

	#[test]
	fn test_build_engine() {
		let engine = LoginBuilder::new(config(
			"private_key = \"db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10\"",
			"",
		))
		.build(LoginFactories::all())
		.unwrap();

		assert_eq!(engine.signatures().domain_url(), "https://app.example.com");
		assert_eq!(engine.signatures().directory_url(), Some("memory://"));
		assert_eq!(engine.directory().endpoint(), "memory://");
	}

	#[test]
	fn test_invalid_signer_config_fails() {
		let result = LoginBuilder::new(config("key_type = \"ED25519\"", ""))
			.build(LoginFactories::all());
		match result {
			Err(BuilderError::Config(message)) => {
				assert!(message.contains("signer implementation 'local'"))
			},
			_ => panic!("expected a configuration error"),
		}
	}

	#[test]
	fn test_missing_factory_fails() {
		let mut factories = LoginFactories::all();
		factories.directory_factories.remove("memory");

		let result = LoginBuilder::new(config(
			"private_key = \"db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10\"",
			"",
		))
		.build(factories);
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	/// Builds an empty memory directory without looking at its config.
	fn unchecked_memory(
		_config: &toml::Value,
	) -> Result<Box<dyn DirectoryInterface>, DirectoryError> {
		Ok(Box::new(MemoryDirectory::new()))
	}

	#[test]
	fn test_config_checked_against_implementation_schema() {
		let factories = LoginFactories {
			signer_factories: LoginFactories::all().signer_factories,
			directory_factories: HashMap::from([(
				"memory".to_string(),
				unchecked_memory as login_directory::DirectoryFactory,
			)]),
		};

		let result = LoginBuilder::new(config(
			&format!("private_key = \"{SERVER_SEED}\""),
			"accounts = 5",
		))
		.build(factories);
		match result {
			Err(BuilderError::Config(message)) => {
				assert!(message.contains("Invalid configuration for directory implementation 'memory'"))
			},
			_ => panic!("expected a schema validation error"),
		}
	}
}
