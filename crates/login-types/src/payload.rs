//! Payload types exchanged between the server and a wallet client.
//!
//! The server hands a [`SigningEnvelope`] to the client, the client signs a
//! [`SignedPayload`] built from it and returns that object together with its
//! own signature. Field names follow the camelCase wire format wallet
//! clients already speak.

use serde::{Deserialize, Serialize};

/// Content attested by the server, bound to the origin it represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload<T> {
	/// Origin/domain the server represents.
	pub url: String,
	/// Caller-supplied content.
	pub data: T,
}

impl<T> Payload<T> {
	pub fn new(url: impl Into<String>, data: T) -> Self {
		Self {
			url: url.into(),
			data,
		}
	}
}

/// The envelope returned by the server when a signing request is made.
///
/// `server_sig` is the base64 signature over the canonical bytes of `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningEnvelope<T> {
	pub payload: Payload<T>,
	pub server_sig: String,
}

impl<T> SigningEnvelope<T> {
	/// Converts the envelope into the object a client is expected to sign.
	pub fn into_signed_payload(self) -> SignedPayload<T> {
		SignedPayload {
			server_signature: self.server_sig,
			original_payload: self.payload,
		}
	}
}

/// The server-signed object a client counter-signs.
///
/// Invariant: `server_signature` verifies against the canonical bytes of
/// `original_payload` under the server's public key. A client signature is
/// computed over the canonical bytes of this whole object, so it covers the
/// server signature as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayload<T> {
	/// Base64 server signature over `original_payload`.
	pub server_signature: String,
	pub original_payload: Payload<T>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_signed_payload_wire_format() {
		let signed = SignedPayload {
			server_signature: "c2ln".to_string(),
			original_payload: Payload::new("https://app.example", json!({"challenge": "abc"})),
		};

		let value = serde_json::to_value(&signed).unwrap();
		assert_eq!(
			value,
			json!({
				"serverSignature": "c2ln",
				"originalPayload": {
					"url": "https://app.example",
					"data": {"challenge": "abc"}
				}
			})
		);
	}

	#[test]
	fn test_envelope_into_signed_payload() {
		let envelope = SigningEnvelope {
			payload: Payload::new("https://app.example", "hello".to_string()),
			server_sig: "c2ln".to_string(),
		};

		let json = serde_json::to_string(&envelope).unwrap();
		assert!(json.contains("\"serverSig\":\"c2ln\""));

		let signed = envelope.into_signed_payload();
		assert_eq!(signed.server_signature, "c2ln");
		assert_eq!(signed.original_payload.data, "hello");
	}
}
