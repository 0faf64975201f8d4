//! Envelope signing and two-stage verification.
//!
//! The server signs `{url, data}` and hands the envelope to a client. The
//! client counter-signs the whole `{serverSignature, originalPayload}` object.
//! Verification first proves the server issued the envelope (stage 1) and
//! only then checks the client signature over it (stage 2). Because stage 2
//! covers the server signature, a client approval cannot be moved onto a
//! different server attestation.

use crate::observer::{NoopObserver, VerificationObserver};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use login_account::{KeyError, PublicKey, SignerError, SignerInterface};
use login_directory::DirectoryError;
use login_types::{
	CanonicalError, Canonicalizable, Payload, SignedPayload, SigningEnvelope, VerificationEvent,
	VerificationStage,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while creating or verifying envelopes.
///
/// A client signature that does not verify is not an error: verification
/// returns `Ok(false)` for it.
#[derive(Debug, Error)]
pub enum SignatureError {
	/// A required verification parameter is absent or empty.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	/// The envelope's server signature does not verify: it was not issued by
	/// this server or was altered after signing.
	#[error("Unauthorized payload submitted")]
	UnauthorizedPayload,
	/// The client public key could not be parsed.
	#[error("Invalid key: {0}")]
	Key(#[from] KeyError),
	/// The payload could not be canonically encoded.
	#[error("Canonical encoding failed: {0}")]
	Canonical(#[from] CanonicalError),
	/// The server signer failed.
	#[error("Signer error: {0}")]
	Signer(#[from] SignerError),
	/// No signature service has been constructed yet.
	#[error("Signature service is not initialized")]
	Uninitialized,
	/// The client's key could not be resolved.
	#[error("Directory error: {0}")]
	Directory(#[from] DirectoryError),
}

/// Service holding the server key and implementing the handshake.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct SignatureService {
	signer: Box<dyn SignerInterface>,
	domain_url: String,
	directory_url: Option<String>,
	observer: Arc<dyn VerificationObserver>,
}

impl SignatureService {
	/// Creates a service signing payloads for `domain_url` with `signer`.
	pub fn new(signer: Box<dyn SignerInterface>, domain_url: impl Into<String>) -> Self {
		Self {
			signer,
			domain_url: domain_url.into(),
			directory_url: None,
			observer: Arc::new(NoopObserver),
		}
	}

	/// Records the directory location client keys are resolved against.
	pub fn with_directory_url(mut self, directory_url: impl Into<String>) -> Self {
		self.directory_url = Some(directory_url.into());
		self
	}

	/// Installs an observer receiving verification events.
	pub fn with_observer(mut self, observer: Arc<dyn VerificationObserver>) -> Self {
		self.observer = observer;
		self
	}

	pub fn domain_url(&self) -> &str {
		&self.domain_url
	}

	pub fn directory_url(&self) -> Option<&str> {
		self.directory_url.as_deref()
	}

	/// Public half of the server key, which clients use to check `serverSig`.
	pub fn public_key(&self) -> PublicKey {
		self.signer.public_key()
	}

	/// Builds `{url, data}` for the configured origin and signs its canonical bytes.
	pub fn create_signing_envelope<T: Serialize>(
		&self,
		data: T,
	) -> Result<SigningEnvelope<T>, SignatureError> {
		let payload = Payload::new(self.domain_url.clone(), data);
		let signature = self.signer.sign(&payload.to_canonical_bytes()?)?;

		self.observer.on_event(&VerificationEvent::EnvelopeCreated {
			url: payload.url.clone(),
		});

		Ok(SigningEnvelope {
			payload,
			server_sig: STANDARD.encode(signature),
		})
	}

	/// Verifies that the client holding `client_public_key` approved exactly
	/// the envelope this server issued.
	///
	/// Fails with [`SignatureError::InvalidArgument`] when a parameter is
	/// missing, and with [`SignatureError::UnauthorizedPayload`] when the
	/// envelope was not signed by this server. The key string is parsed only
	/// once stage 1 has passed. Returns whether the client signature verifies.
	pub fn verify_client_signature<T: Serialize>(
		&self,
		client_public_key: &str,
		signed_payload: Option<&SignedPayload<T>>,
		client_signature: &str,
	) -> Result<bool, SignatureError> {
		if client_public_key.trim().is_empty() {
			return Err(self.precondition_failed("client public key is required"));
		}
		let signed_payload = self.check_inputs(signed_payload, client_signature)?;

		self.verify_stages(signed_payload, client_signature, || {
			client_public_key.parse::<PublicKey>()
		})
	}

	/// Same as [`verify_client_signature`](Self::verify_client_signature) for
	/// an already-parsed client key.
	pub fn verify_client_signature_with_key<T: Serialize>(
		&self,
		client_key: &PublicKey,
		signed_payload: Option<&SignedPayload<T>>,
		client_signature: &str,
	) -> Result<bool, SignatureError> {
		let signed_payload = self.check_inputs(signed_payload, client_signature)?;
		self.verify_stages(signed_payload, client_signature, || Ok(client_key.clone()))
	}

	pub(crate) fn check_inputs<'a, T>(
		&self,
		signed_payload: Option<&'a SignedPayload<T>>,
		client_signature: &str,
	) -> Result<&'a SignedPayload<T>, SignatureError> {
		let signed_payload =
			signed_payload.ok_or_else(|| self.precondition_failed("signed payload is required"))?;
		if client_signature.trim().is_empty() {
			return Err(self.precondition_failed("client signature is required"));
		}
		Ok(signed_payload)
	}

	fn verify_stages<T, K>(
		&self,
		signed_payload: &SignedPayload<T>,
		client_signature: &str,
		client_key: K,
	) -> Result<bool, SignatureError>
	where
		T: Serialize,
		K: FnOnce() -> Result<PublicKey, KeyError>,
	{
		// Stage 1: the envelope came from this server.
		let payload_bytes = signed_payload
			.original_payload
			.to_canonical_bytes()
			.map_err(|e| self.rejected(VerificationStage::ServerSignature, e.into()))?;
		let server_valid = STANDARD
			.decode(&signed_payload.server_signature)
			.is_ok_and(|signature| self.signer.verify(&payload_bytes, &signature));

		self.observer
			.on_event(&VerificationEvent::ServerSignatureChecked {
				valid: server_valid,
			});
		if !server_valid {
			return Err(self.rejected(
				VerificationStage::ServerSignature,
				SignatureError::UnauthorizedPayload,
			));
		}

		// Stage 2: the client signed the whole envelope, server signature included.
		let client_key =
			client_key().map_err(|e| self.rejected(VerificationStage::ClientSignature, e.into()))?;
		let envelope_bytes = signed_payload
			.to_canonical_bytes()
			.map_err(|e| self.rejected(VerificationStage::ClientSignature, e.into()))?;
		let client_valid = STANDARD
			.decode(client_signature)
			.is_ok_and(|signature| client_key.verify(&envelope_bytes, &signature));

		self.observer
			.on_event(&VerificationEvent::ClientSignatureChecked {
				valid: client_valid,
				client_public_key: client_key.to_string(),
			});

		Ok(client_valid)
	}

	pub(crate) fn precondition_failed(&self, message: &str) -> SignatureError {
		self.rejected(
			VerificationStage::Preconditions,
			SignatureError::InvalidArgument(message.to_string()),
		)
	}

	fn rejected(&self, stage: VerificationStage, error: SignatureError) -> SignatureError {
		self.observer
			.on_event(&VerificationEvent::VerificationRejected {
				stage,
				reason: error.to_string(),
			});
		error
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use login_account::{implementations::local::LocalSigner, PrivateKey};
	use login_types::canonicalize;
	use serde_json::{json, Value};
	use std::sync::Mutex;

	const SERVER_SEED: &str = "db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10";
	const ECDSA_SCALAR: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const CLIENT_SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
	const DOMAIN: &str = "https://app.example.com";

	#[derive(Default)]
	struct RecordingObserver(Mutex<Vec<VerificationEvent>>);

	impl RecordingObserver {
		fn events(&self) -> Vec<VerificationEvent> {
			self.0.lock().unwrap().clone()
		}
	}

	impl VerificationObserver for RecordingObserver {
		fn on_event(&self, event: &VerificationEvent) {
			self.0.lock().unwrap().push(event.clone());
		}
	}

	fn service_with(key: PrivateKey) -> SignatureService {
		SignatureService::new(Box::new(LocalSigner::new(key)), DOMAIN)
	}

	fn service() -> SignatureService {
		service_with(SERVER_SEED.parse().unwrap())
	}

	fn client_key() -> PrivateKey {
		CLIENT_SEED.parse().unwrap()
	}

	/// What a wallet does with the envelope: sign the canonical signed payload.
	fn client_sign<T: Serialize>(key: &PrivateKey, signed: &SignedPayload<T>) -> String {
		STANDARD.encode(key.sign(&signed.to_canonical_bytes().unwrap()))
	}

	#[test]
	fn test_envelope_round_trip() {
		let service = service();
		let envelope = service
			.create_signing_envelope(json!({"challenge": "abc", "nonce": 7}))
			.unwrap();

		assert_eq!(envelope.payload.url, DOMAIN);
		let message = canonicalize(&json!({
			"url": DOMAIN,
			"data": {"nonce": 7, "challenge": "abc"}
		}));
		let signature = STANDARD.decode(&envelope.server_sig).unwrap();
		assert!(service.public_key().verify(&message, &signature));
	}

	#[test]
	fn test_client_approval_verifies() {
		let service = service();
		let signed = service
			.create_signing_envelope(json!({"login": "0.0.1001"}))
			.unwrap()
			.into_signed_payload();
		let client = client_key();
		let signature = client_sign(&client, &signed);

		let verified = service
			.verify_client_signature(&client.public_key().to_string(), Some(&signed), &signature)
			.unwrap();
		assert!(verified);
	}

	#[test]
	fn test_ecdsa_client_approval_verifies() {
		let service = service();
		let signed = service
			.create_signing_envelope("hello".to_string())
			.unwrap()
			.into_signed_payload();
		let client = PrivateKey::from_str_ecdsa(ECDSA_SCALAR).unwrap();
		let signature = client_sign(&client, &signed);

		let verified = service
			.verify_client_signature(&client.public_key().to_string(), Some(&signed), &signature)
			.unwrap();
		assert!(verified);
	}

	#[test]
	fn test_wrong_client_key_is_negative_answer() {
		let service = service();
		let signed = service
			.create_signing_envelope(json!([1, 2, 3]))
			.unwrap()
			.into_signed_payload();
		let signature = client_sign(&client_key(), &signed);
		let other = PrivateKey::from_str_ecdsa(ECDSA_SCALAR).unwrap().public_key();

		assert!(!service
			.verify_client_signature(&other.to_string(), Some(&signed), &signature)
			.unwrap());
		assert!(!service
			.verify_client_signature(
				&client_key().public_key().to_string(),
				Some(&signed),
				"not base64!"
			)
			.unwrap());
	}

	#[test]
	fn test_tampered_data_fails_stage_one() {
		let service = service();
		let mut signed = service
			.create_signing_envelope(json!({"amount": 10}))
			.unwrap()
			.into_signed_payload();
		signed.original_payload.data = json!({"amount": 1000});

		let client = client_key();
		let over_tampered = client_sign(&client, &signed);
		for signature in [over_tampered.as_str(), "AAAA"] {
			assert!(matches!(
				service.verify_client_signature(
					&client.public_key().to_string(),
					Some(&signed),
					signature
				),
				Err(SignatureError::UnauthorizedPayload)
			));
		}
	}

	#[test]
	fn test_foreign_server_signature_fails_stage_one() {
		let foreign = service_with(PrivateKey::from_str_ecdsa(ECDSA_SCALAR).unwrap());
		let signed = foreign
			.create_signing_envelope(json!({"a": 1}))
			.unwrap()
			.into_signed_payload();
		let client = client_key();

		let result = service().verify_client_signature(
			&client.public_key().to_string(),
			Some(&signed),
			&client_sign(&client, &signed),
		);
		assert!(matches!(result, Err(SignatureError::UnauthorizedPayload)));

		let mut garbled = signed.clone();
		garbled.server_signature = "%%%".to_string();
		assert!(matches!(
			foreign.verify_client_signature(
				&client.public_key().to_string(),
				Some(&garbled),
				"AAAA"
			),
			Err(SignatureError::UnauthorizedPayload)
		));
	}

	#[test]
	fn test_client_signature_covers_server_signature() {
		let service = service();
		let first = service
			.create_signing_envelope(json!({"session": "s1"}))
			.unwrap()
			.into_signed_payload();
		let second = service
			.create_signing_envelope(json!({"session": "s2"}))
			.unwrap()
			.into_signed_payload();
		let client = client_key();
		let client_public = client.public_key().to_string();
		let signature = client_sign(&client, &first);

		assert!(service
			.verify_client_signature(&client_public, Some(&first), &signature)
			.unwrap());
		// Both envelopes pass stage 1; the approval only belongs to the first.
		assert!(!service
			.verify_client_signature(&client_public, Some(&second), &signature)
			.unwrap());
	}

	#[test]
	fn test_high_s_server_signature_fails_stage_one() {
		let service = service_with(PrivateKey::from_str_ecdsa(ECDSA_SCALAR).unwrap());
		let signed = service
			.create_signing_envelope(json!({"session": "s1"}))
			.unwrap()
			.into_signed_payload();

		let original = k256::ecdsa::Signature::from_slice(
			&STANDARD.decode(&signed.server_signature).unwrap(),
		)
		.unwrap();
		let (r, s) = original.split_scalars();
		let flipped = k256::ecdsa::Signature::from_scalars(r.to_bytes(), (-*s).to_bytes()).unwrap();

		let mut swapped = signed.clone();
		swapped.server_signature = STANDARD.encode(flipped.to_bytes());
		assert_ne!(swapped.server_signature, signed.server_signature);

		let client = client_key();
		let signature = client_sign(&client, &swapped);
		assert!(matches!(
			service.verify_client_signature(
				&client.public_key().to_string(),
				Some(&swapped),
				&signature
			),
			Err(SignatureError::UnauthorizedPayload)
		));
	}

	#[test]
	fn test_signatures_decoded_as_supplied() {
		let service = service();
		let signed = service
			.create_signing_envelope(json!({"k": "v"}))
			.unwrap()
			.into_signed_payload();
		let client = client_key();
		let client_public = client.public_key().to_string();
		let signature = client_sign(&client, &signed);

		assert!(!service
			.verify_client_signature(&client_public, Some(&signed), &format!(" {signature}\n"))
			.unwrap());

		let mut padded = signed.clone();
		padded.server_signature = format!("{}\n", signed.server_signature);
		assert!(matches!(
			service.verify_client_signature(&client_public, Some(&padded), &signature),
			Err(SignatureError::UnauthorizedPayload)
		));
	}

	#[test]
	fn test_preconditions_checked_first() {
		let observer = Arc::new(RecordingObserver::default());
		let service = service().with_observer(observer.clone());
		let signed = service
			.create_signing_envelope(Value::Null)
			.unwrap()
			.into_signed_payload();
		let client = client_key().public_key().to_string();

		let cases = [
			service.verify_client_signature("", Some(&signed), "AAAA"),
			service.verify_client_signature::<Value>(&client, None, "AAAA"),
			service.verify_client_signature(&client, Some(&signed), ""),
		];
		for result in cases {
			assert!(matches!(result, Err(SignatureError::InvalidArgument(_))));
		}

		let events = observer.events();
		assert_eq!(events.len(), 4);
		assert!(events[1..].iter().all(|event| matches!(
			event,
			VerificationEvent::VerificationRejected {
				stage: VerificationStage::Preconditions,
				..
			}
		)));
	}

	#[test]
	fn test_malformed_client_key_propagates() {
		let service = service();
		let signed = service
			.create_signing_envelope(json!({}))
			.unwrap()
			.into_signed_payload();

		assert!(matches!(
			service.verify_client_signature("zzzz", Some(&signed), "AAAA"),
			Err(SignatureError::Key(KeyError::Hex(_)))
		));
		assert!(matches!(
			service.verify_client_signature("abcd", Some(&signed), "AAAA"),
			Err(SignatureError::Key(_))
		));
	}

	#[test]
	fn test_observer_sees_both_stages() {
		let observer = Arc::new(RecordingObserver::default());
		let service = service().with_observer(observer.clone());
		let signed = service
			.create_signing_envelope(json!({"x": true}))
			.unwrap()
			.into_signed_payload();
		let client = client_key();
		let signature = client_sign(&client, &signed);

		service
			.verify_client_signature(&client.public_key().to_string(), Some(&signed), &signature)
			.unwrap();

		assert_eq!(
			observer.events(),
			vec![
				VerificationEvent::EnvelopeCreated {
					url: DOMAIN.to_string()
				},
				VerificationEvent::ServerSignatureChecked { valid: true },
				VerificationEvent::ClientSignatureChecked {
					valid: true,
					client_public_key: client.public_key().to_string(),
				},
			]
		);
	}

	#[test]
	fn test_verify_with_parsed_key() {
		let service = service().with_directory_url("memory://");
		assert_eq!(service.directory_url(), Some("memory://"));

		let signed = service
			.create_signing_envelope(json!({"k": "v"}))
			.unwrap()
			.into_signed_payload();
		let client = client_key();
		let signature = client_sign(&client, &signed);

		assert!(service
			.verify_client_signature_with_key(&client.public_key(), Some(&signed), &signature)
			.unwrap());
	}
}
