//! Key parsing, signing and verification for ED25519 and ECDSA keys.
//!
//! Keys are read from hex strings, either raw or DER-wrapped. ECDSA keys are
//! secp256k1 and sign the keccak256 digest of the message, producing the
//! 64-byte `r || s` form wallets use.

use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::{DigestSigner, DigestVerifier};
use login_types::{AccountKey, KeyType};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// `302e020100300506032b657004220420`
const ED25519_PRIVATE_DER_PREFIX: [u8; 16] = [
	0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];
/// `3030020100300706052b8104000a04220420`
const ECDSA_PRIVATE_DER_PREFIX: [u8; 18] = [
	0x30, 0x30, 0x02, 0x01, 0x00, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x0a, 0x04, 0x22,
	0x04, 0x20,
];
/// `302a300506032b6570032100`
const ED25519_PUBLIC_DER_PREFIX: [u8; 12] = [
	0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];
/// `302d300706052b8104000a032200`
const ECDSA_PUBLIC_DER_PREFIX: [u8; 14] = [
	0x30, 0x2d, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x0a, 0x03, 0x22, 0x00,
];
/// `3036301006072a8648ce3d020106052b8104000a032200`, the RFC 5480 form with
/// the `id-ecPublicKey` algorithm identifier.
const ECDSA_PUBLIC_SPKI_PREFIX: [u8; 23] = [
	0x30, 0x36, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05, 0x2b,
	0x81, 0x04, 0x00, 0x0a, 0x03, 0x22, 0x00,
];

/// Strips either ECDSA public key DER prefix.
fn strip_ecdsa_public_der(bytes: &[u8]) -> Option<&[u8]> {
	bytes
		.strip_prefix(&ECDSA_PUBLIC_DER_PREFIX)
		.or_else(|| bytes.strip_prefix(&ECDSA_PUBLIC_SPKI_PREFIX))
}

/// Errors that can occur while parsing key strings.
#[derive(Debug, Error)]
pub enum KeyError {
	#[error("Invalid hex in key: {0}")]
	Hex(#[from] hex::FromHexError),
	#[error("Unrecognized {kind} key encoding ({len} bytes)")]
	UnrecognizedEncoding { kind: &'static str, len: usize },
	#[error("Invalid {0} key: {1}")]
	Invalid(KeyType, String),
}

fn decode_hex(s: &str) -> Result<Vec<u8>, KeyError> {
	let s = s.trim();
	Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
}

fn ed25519_signing_key(raw: &[u8]) -> Result<PrivateKey, KeyError> {
	let seed: [u8; 32] = raw.try_into().map_err(|_| {
		KeyError::Invalid(
			KeyType::Ed25519,
			format!("expected 32 bytes, got {}", raw.len()),
		)
	})?;
	Ok(PrivateKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(
		&seed,
	)))
}

fn ecdsa_signing_key(raw: &[u8]) -> Result<PrivateKey, KeyError> {
	k256::ecdsa::SigningKey::from_slice(raw)
		.map(PrivateKey::Ecdsa)
		.map_err(|e| KeyError::Invalid(KeyType::Ecdsa, e.to_string()))
}

fn ed25519_verifying_key(raw: &[u8]) -> Result<PublicKey, KeyError> {
	let bytes: [u8; 32] = raw.try_into().map_err(|_| {
		KeyError::Invalid(
			KeyType::Ed25519,
			format!("expected 32 bytes, got {}", raw.len()),
		)
	})?;
	ed25519_dalek::VerifyingKey::from_bytes(&bytes)
		.map(PublicKey::Ed25519)
		.map_err(|e| KeyError::Invalid(KeyType::Ed25519, e.to_string()))
}

fn ecdsa_verifying_key(raw: &[u8]) -> Result<PublicKey, KeyError> {
	k256::ecdsa::VerifyingKey::from_sec1_bytes(raw)
		.map(PublicKey::Ecdsa)
		.map_err(|e| KeyError::Invalid(KeyType::Ecdsa, e.to_string()))
}

/// A private key held by the server.
#[derive(Clone)]
pub enum PrivateKey {
	Ed25519(ed25519_dalek::SigningKey),
	Ecdsa(k256::ecdsa::SigningKey),
}

impl PrivateKey {
	/// Parses an ED25519 key: DER hex, raw 32-byte seed, or 64-byte seed+public.
	pub fn from_str_ed25519(s: &str) -> Result<Self, KeyError> {
		let bytes = decode_hex(s)?;
		if let Some(raw) = bytes.strip_prefix(&ED25519_PRIVATE_DER_PREFIX) {
			return ed25519_signing_key(raw);
		}
		match bytes.len() {
			32 | 64 => ed25519_signing_key(&bytes[..32]),
			len => Err(KeyError::UnrecognizedEncoding {
				kind: "ED25519 private",
				len,
			}),
		}
	}

	/// Parses a secp256k1 key: DER hex or a raw 32-byte scalar.
	pub fn from_str_ecdsa(s: &str) -> Result<Self, KeyError> {
		let bytes = decode_hex(s)?;
		let raw = bytes
			.strip_prefix(&ECDSA_PRIVATE_DER_PREFIX)
			.unwrap_or(&bytes);
		ecdsa_signing_key(raw)
	}

	/// Parses a key of a known type.
	pub fn from_str_typed(s: &str, key_type: KeyType) -> Result<Self, KeyError> {
		match key_type {
			KeyType::Ed25519 => Self::from_str_ed25519(s),
			KeyType::Ecdsa => Self::from_str_ecdsa(s),
		}
	}

	pub fn key_type(&self) -> KeyType {
		match self {
			PrivateKey::Ed25519(_) => KeyType::Ed25519,
			PrivateKey::Ecdsa(_) => KeyType::Ecdsa,
		}
	}

	pub fn public_key(&self) -> PublicKey {
		match self {
			PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
			PrivateKey::Ecdsa(key) => PublicKey::Ecdsa(key.verifying_key().clone()),
		}
	}

	/// Signs `message`. ECDSA signs its keccak256 digest.
	pub fn sign(&self, message: &[u8]) -> Vec<u8> {
		match self {
			PrivateKey::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
			PrivateKey::Ecdsa(key) => {
				let signature: k256::ecdsa::Signature =
					key.sign_digest(Keccak256::new_with_prefix(message));
				signature.to_bytes().to_vec()
			},
		}
	}
}

/// Detects the key type from the encoding.
///
/// DER prefixes are unambiguous. A bare 32-byte value is ED25519 unless it
/// carries a `0x` prefix, which selects ECDSA.
impl FromStr for PrivateKey {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let explicit_ecdsa = s.trim().starts_with("0x");
		let bytes = decode_hex(s)?;

		if let Some(raw) = bytes.strip_prefix(&ED25519_PRIVATE_DER_PREFIX) {
			return ed25519_signing_key(raw);
		}
		if let Some(raw) = bytes.strip_prefix(&ECDSA_PRIVATE_DER_PREFIX) {
			return ecdsa_signing_key(raw);
		}

		match (bytes.len(), explicit_ecdsa) {
			(32, true) => ecdsa_signing_key(&bytes),
			(32, false) | (64, false) => ed25519_signing_key(&bytes[..32]),
			(len, _) => Err(KeyError::UnrecognizedEncoding {
				kind: "private",
				len,
			}),
		}
	}
}

impl fmt::Debug for PrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "PrivateKey({}, public={})", self.key_type(), self.public_key())
	}
}

/// A public key, parsed from its string form.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKey {
	Ed25519(ed25519_dalek::VerifyingKey),
	Ecdsa(k256::ecdsa::VerifyingKey),
}

impl PublicKey {
	/// Parses a public key whose type was declared by the directory.
	pub fn from_account_key(key: &AccountKey) -> Result<Self, KeyError> {
		Self::from_str_typed(&key.key, key.key_type)
	}

	pub fn from_str_typed(s: &str, key_type: KeyType) -> Result<Self, KeyError> {
		let bytes = decode_hex(s)?;
		match key_type {
			KeyType::Ed25519 => ed25519_verifying_key(
				bytes
					.strip_prefix(&ED25519_PUBLIC_DER_PREFIX)
					.unwrap_or(&bytes),
			),
			KeyType::Ecdsa => ecdsa_verifying_key(strip_ecdsa_public_der(&bytes).unwrap_or(&bytes)),
		}
	}

	pub fn key_type(&self) -> KeyType {
		match self {
			PublicKey::Ed25519(_) => KeyType::Ed25519,
			PublicKey::Ecdsa(_) => KeyType::Ecdsa,
		}
	}

	/// Raw public key bytes: 32 for ED25519, 33 (compressed) for ECDSA.
	pub fn to_bytes(&self) -> Vec<u8> {
		match self {
			PublicKey::Ed25519(key) => key.to_bytes().to_vec(),
			PublicKey::Ecdsa(key) => key.to_encoded_point(true).as_bytes().to_vec(),
		}
	}

	/// Returns whether `signature` is a valid signature of `message`.
	///
	/// Malformed signature bytes are a negative answer, not an error.
	pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
		match self {
			PublicKey::Ed25519(key) => {
				let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
					return false;
				};
				key.verify(message, &signature).is_ok()
			},
			PublicKey::Ecdsa(key) => {
				let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
					return false;
				};
				let signature = signature.normalize_s().unwrap_or(signature);
				key.verify_digest(Keccak256::new_with_prefix(message), &signature)
					.is_ok()
			},
		}
	}

	/// Like [`verify`](Self::verify), but ECDSA signatures must be in the
	/// low-S form this crate signs with.
	pub fn verify_strict(&self, message: &[u8], signature: &[u8]) -> bool {
		match self {
			PublicKey::Ed25519(_) => self.verify(message, signature),
			PublicKey::Ecdsa(key) => {
				let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
					return false;
				};
				signature.normalize_s().is_none()
					&& key
						.verify_digest(Keccak256::new_with_prefix(message), &signature)
						.is_ok()
			},
		}
	}
}

impl FromStr for PublicKey {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = decode_hex(s)?;

		if let Some(raw) = bytes.strip_prefix(&ED25519_PUBLIC_DER_PREFIX) {
			return ed25519_verifying_key(raw);
		}
		if let Some(raw) = strip_ecdsa_public_der(&bytes) {
			return ecdsa_verifying_key(raw);
		}

		match bytes.len() {
			32 => ed25519_verifying_key(&bytes),
			33 | 65 => ecdsa_verifying_key(&bytes),
			len => Err(KeyError::UnrecognizedEncoding {
				kind: "public",
				len,
			}),
		}
	}
}

/// Raw hex encoding, the form directories publish.
impl fmt::Display for PublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&hex::encode(self.to_bytes()))
	}
}
