//! Configuration module for the login server.
//!
//! Configuration is a single TOML file. String values may reference
//! environment variables as `${VAR}` or `${VAR:-default}`; references are
//! resolved before parsing, so secrets such as the server private key can be
//! kept out of the file.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error embeds the input, which may contain resolved secrets.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the login server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this server.
	pub server: ServerConfig,
	/// Server signing key.
	pub signer: ComponentConfig,
	/// Account directory used to resolve client keys.
	pub directory: ComponentConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Identity of this server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
	/// Origin embedded as `url` in every payload the server signs.
	pub domain_url: String,
}

/// A pluggable component: which implementation is active and the raw TOML
/// of every configured implementation.
#[derive(Clone, Deserialize, Serialize)]
pub struct ComponentConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl ComponentConfig {
	/// Raw configuration of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

// Implementation tables may hold private keys, so only names are printed.
impl fmt::Debug for ComponentConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.implementations.keys().collect();
		names.sort();
		f.debug_struct("ComponentConfig")
			.field("primary", &self.primary)
			.field("implementations", &names)
			.finish()
	}
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	64 * 1024
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of the environment variable and
/// `${VAR_NAME:-default}` with the value or, if unset, the default.
/// Input is limited to 1MB to bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut resolved = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};

		resolved.push_str(&input[last..whole.start()]);
		resolved.push_str(&value);
		last = whole.end();
	}
	resolved.push_str(&input[last..]);

	Ok(resolved)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - the domain URL is not empty
	/// - signer and directory each name a primary that is configured
	/// - an enabled API has a non-zero timeout and request size
	fn validate(&self) -> Result<(), ConfigError> {
		if self.server.domain_url.trim().is_empty() {
			return Err(ConfigError::Validation(
				"server.domain_url cannot be empty".into(),
			));
		}

		validate_component("signer", &self.signer)?;
		validate_component("directory", &self.directory)?;

		if let Some(api) = self.api.as_ref().filter(|api| api.enabled) {
			if api.timeout_seconds == 0 {
				return Err(ConfigError::Validation(
					"api.timeout_seconds must be greater than 0".into(),
				));
			}
			if api.max_request_size == 0 {
				return Err(ConfigError::Validation(
					"api.max_request_size must be greater than 0".into(),
				));
			}
		}

		Ok(())
	}
}

fn validate_component(section: &str, component: &ComponentConfig) -> Result<(), ConfigError> {
	if component.primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{}.primary cannot be empty",
			section
		)));
	}
	if component.primary_config().is_none() {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, component.primary
		)));
	}
	Ok(())
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved first and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
