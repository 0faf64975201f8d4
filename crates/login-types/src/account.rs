//! Account types produced by directory resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a key type string is outside the closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported key type: {0}")]
pub struct UnknownKeyType(pub String);

/// The two key algorithms an account may be controlled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
	#[serde(rename = "ED25519")]
	Ed25519,
	/// secp256k1 ECDSA. Public mirror nodes report it as `ECDSA_SECP256K1`.
	#[serde(rename = "ECDSA", alias = "ECDSA_SECP256K1")]
	Ecdsa,
}

impl KeyType {
	pub fn as_str(&self) -> &'static str {
		match self {
			KeyType::Ed25519 => "ED25519",
			KeyType::Ecdsa => "ECDSA",
		}
	}
}

impl fmt::Display for KeyType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for KeyType {
	type Err = UnknownKeyType;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"ED25519" => Ok(KeyType::Ed25519),
			"ECDSA" | "ECDSA_SECP256K1" => Ok(KeyType::Ecdsa),
			other => Err(UnknownKeyType(other.to_string())),
		}
	}
}

/// Key material of an account as declared by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
	pub key_type: KeyType,
	/// Encoded public key, verbatim from the directory.
	pub key: String,
}

/// Result of resolving an account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeyInfo {
	pub account_id: String,
	pub key: AccountKey,
}

/// Public ledger networks with a well-known directory endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
	Mainnet,
	Testnet,
}

impl Network {
	/// Base URL of the public mirror node REST API, including the `/api/v1` prefix.
	pub fn mirror_node_url(&self) -> &'static str {
		match self {
			Network::Mainnet => "https://mainnet-public.mirrornode.hedera.com/api/v1",
			Network::Testnet => "https://testnet.mirrornode.hedera.com/api/v1",
		}
	}
}

impl FromStr for Network {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"mainnet" => Ok(Network::Mainnet),
			"testnet" => Ok(Network::Testnet),
			other => Err(format!("Unknown network '{}'", other)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_key_type_is_closed() {
		assert_eq!("ED25519".parse::<KeyType>(), Ok(KeyType::Ed25519));
		assert_eq!("ECDSA".parse::<KeyType>(), Ok(KeyType::Ecdsa));
		assert_eq!("ECDSA_SECP256K1".parse::<KeyType>(), Ok(KeyType::Ecdsa));
		assert_eq!(
			"RSA".parse::<KeyType>(),
			Err(UnknownKeyType("RSA".to_string()))
		);
		assert!(serde_json::from_value::<KeyType>(json!("ProtobufEncoded")).is_err());
	}

	#[test]
	fn test_account_key_info_serialization() {
		let info = AccountKeyInfo {
			account_id: "0.0.1001".to_string(),
			key: AccountKey {
				key_type: KeyType::Ed25519,
				key: "abcd".to_string(),
			},
		};

		assert_eq!(
			serde_json::to_value(&info).unwrap(),
			json!({"accountId": "0.0.1001", "key": {"keyType": "ED25519", "key": "abcd"}})
		);
	}

	#[test]
	fn test_network_urls() {
		assert!(Network::Mainnet.mirror_node_url().starts_with("https://mainnet"));
		assert!(Network::Testnet.mirror_node_url().ends_with("/api/v1"));
		assert_eq!("testnet".parse::<Network>(), Ok(Network::Testnet));
		assert!("devnet".parse::<Network>().is_err());
	}
}
