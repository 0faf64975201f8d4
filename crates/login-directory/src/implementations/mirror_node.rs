//! Directory backed by a ledger mirror node REST API.
//!
//! Issues `GET {url}/accounts?account.id={id}` and returns the `accounts`
//! array of the response. The base URL either comes from configuration or
//! from one of the public networks.

use crate::{AccountRecord, DirectoryError, DirectoryInterface};
use async_trait::async_trait;
use login_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Network, Schema, ValidationError,
};
use serde::Deserialize;
use std::time::Duration;

/// Default request timeout when none is configured.
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Response of the mirror node `/accounts` endpoint.
///
/// `links` (pagination) is not followed: an exact-id query yields at most one
/// page of candidates.
#[derive(Debug, Deserialize)]
struct AccountsResponse {
	accounts: Vec<AccountRecord>,
}

/// Directory querying a mirror node over HTTP.
pub struct MirrorNodeDirectory {
	client: reqwest::Client,
	base_url: String,
}

impl MirrorNodeDirectory {
	/// Creates a directory for `base_url`, which includes the API version prefix.
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		let base_url = base_url.into().trim_end_matches('/').to_string();
		Ok(Self { client, base_url })
	}

	/// Creates a directory for a public network's mirror node.
	pub fn for_network(network: Network, timeout: Duration) -> Result<Self, DirectoryError> {
		Self::new(network.mirror_node_url(), timeout)
	}
}

#[async_trait]
impl DirectoryInterface for MirrorNodeDirectory {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MirrorNodeSchema)
	}

	fn endpoint(&self) -> String {
		self.base_url.clone()
	}

	async fn lookup(&self, account_id: &str) -> Result<Vec<AccountRecord>, DirectoryError> {
		tracing::debug!(account_id, base_url = %self.base_url, "Querying mirror node");

		let body = self
			.client
			.get(format!("{}/accounts", self.base_url))
			.query(&[("account.id", account_id)])
			.send()
			.await?
			.error_for_status()?
			.bytes()
			.await?;

		let response: AccountsResponse = serde_json::from_slice(&body)
			.map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;

		Ok(response.accounts)
	}
}

/// Configuration schema for MirrorNodeDirectory.
pub struct MirrorNodeSchema;

impl ConfigSchema for MirrorNodeSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("url", FieldType::Url),
				Field::new("network", FieldType::String).with_validator(|value| {
					value
						.as_str()
						.unwrap_or_default()
						.parse::<Network>()
						.map(|_| ())
				}),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		)
		.with_exclusive(&["url", "network"]);

		schema.validate(config)
	}
}

/// Factory function to create a mirror node directory from configuration.
///
/// Configuration parameters:
/// - `url`: mirror node base URL including `/api/v1`, or
/// - `network`: `"mainnet"` or `"testnet"`
/// - `timeout_seconds` (optional): request timeout, defaults to 10
pub fn create_directory(
	config: &toml::Value,
) -> Result<Box<dyn DirectoryInterface>, DirectoryError> {
	MirrorNodeSchema
		.validate(config)
		.map_err(|e| DirectoryError::Configuration(e.to_string()))?;

	let timeout = Duration::from_secs(
		config
			.get("timeout_seconds")
			.and_then(|v| v.as_integer())
			.map(|v| v as u64)
			.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
	);

	let directory = match config.get("url").and_then(|v| v.as_str()) {
		Some(url) => MirrorNodeDirectory::new(url, timeout)?,
		None => {
			let network = config
				.get("network")
				.and_then(|v| v.as_str())
				.unwrap_or_default()
				.parse::<Network>()
				.map_err(DirectoryError::Configuration)?;
			MirrorNodeDirectory::for_network(network, timeout)?
		},
	};

	Ok(Box::new(directory))
}

/// Registry for the mirror node directory implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mirror_node";
	type Factory = crate::DirectoryFactory;

	fn factory() -> Self::Factory {
		create_directory
	}
}

impl crate::DirectoryRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::DirectoryService;
	use login_types::KeyType;
	use serde_json::json;
	use wiremock::{
		matchers::{method, path, query_param},
		Mock, MockServer, ResponseTemplate,
	};

	fn directory(server: &MockServer) -> DirectoryService {
		let directory =
			MirrorNodeDirectory::new(format!("{}/api/v1/", server.uri()), Duration::from_secs(5))
				.unwrap();
		DirectoryService::new(Box::new(directory))
	}

	#[tokio::test]
	async fn test_resolve_account() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/accounts"))
			.and(query_param("account.id", "0.0.1001"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"accounts": [
					{"account": "0.0.1001", "key": {"_type": "ED25519", "key": "abcd"}}
				],
				"links": {"next": null}
			})))
			.expect(1)
			.mount(&server)
			.await;

		let info = directory(&server).resolve("0.0.1001").await.unwrap();
		assert_eq!(
			serde_json::to_value(&info).unwrap(),
			json!({"accountId": "0.0.1001", "key": {"keyType": "ED25519", "key": "abcd"}})
		);
		assert_eq!(info.key.key_type, KeyType::Ed25519);
	}

	#[tokio::test]
	async fn test_empty_result_is_not_found() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/accounts"))
			.respond_with(
				ResponseTemplate::new(200).set_body_json(json!({"accounts": [], "links": {}})),
			)
			.mount(&server)
			.await;

		assert!(matches!(
			directory(&server).resolve("0.0.42").await,
			Err(DirectoryError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_null_key_is_missing_key() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/accounts"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"accounts": [{"account": "0.0.7", "key": null}]
			})))
			.mount(&server)
			.await;

		assert!(matches!(
			directory(&server).resolve("0.0.7").await,
			Err(DirectoryError::MissingKey(_))
		));
	}

	#[tokio::test]
	async fn test_error_status_is_transport_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/accounts"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;

		match directory(&server).resolve("0.0.1001").await {
			Err(DirectoryError::Transport(e)) => {
				assert_eq!(e.status().map(|s| s.as_u16()), Some(503))
			},
			other => panic!("expected Transport, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_malformed_body_is_invalid_response() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api/v1/accounts"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"links": {}})))
			.mount(&server)
			.await;

		assert!(matches!(
			directory(&server).resolve("0.0.1001").await,
			Err(DirectoryError::InvalidResponse(_))
		));
	}

	#[test]
	fn test_factory_config() {
		let by_network: toml::Value = toml::from_str("network = \"testnet\"").unwrap();
		let directory = create_directory(&by_network).unwrap();
		assert_eq!(directory.endpoint(), Network::Testnet.mirror_node_url());

		let by_url: toml::Value =
			toml::from_str("url = \"http://localhost:5551/api/v1/\"\ntimeout_seconds = 3")
				.unwrap();
		assert_eq!(
			create_directory(&by_url).unwrap().endpoint(),
			"http://localhost:5551/api/v1"
		);

		let both: toml::Value =
			toml::from_str("url = \"http://localhost\"\nnetwork = \"mainnet\"").unwrap();
		assert!(matches!(
			create_directory(&both),
			Err(DirectoryError::Configuration(_))
		));

		let unknown: toml::Value = toml::from_str("network = \"previewnet\"").unwrap();
		assert!(create_directory(&unknown).is_err());
	}
}
