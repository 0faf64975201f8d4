//! The assembled login engine.

use crate::signature::{SignatureError, SignatureService};
use login_account::PublicKey;
use login_config::Config;
use login_directory::{DirectoryError, DirectoryService};
use login_types::{AccountKeyInfo, SignedPayload, SigningEnvelope};
use serde::Serialize;
use std::sync::Arc;

/// Signature service and account directory built from one configuration.
///
/// Cloning is cheap; clones share the same services.
#[derive(Clone)]
pub struct LoginEngine {
	config: Config,
	signatures: Arc<SignatureService>,
	directory: Arc<DirectoryService>,
}

impl LoginEngine {
	pub fn new(
		config: Config,
		signatures: Arc<SignatureService>,
		directory: Arc<DirectoryService>,
	) -> Self {
		Self {
			config,
			signatures,
			directory,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn signatures(&self) -> &Arc<SignatureService> {
		&self.signatures
	}

	pub fn directory(&self) -> &Arc<DirectoryService> {
		&self.directory
	}

	/// Creates a signing envelope for `data`.
	pub fn create_signing_envelope<T: Serialize>(
		&self,
		data: T,
	) -> Result<SigningEnvelope<T>, SignatureError> {
		self.signatures.create_signing_envelope(data)
	}

	/// Resolves an account identifier to its current key.
	pub async fn resolve_account(&self, account_id: &str) -> Result<AccountKeyInfo, DirectoryError> {
		self.directory.resolve(account_id).await
	}

	/// Verifies a client signature using the key the directory holds for
	/// `account_id`.
	///
	/// Parameters are checked before the directory is queried.
	pub async fn verify_account_signature<T: Serialize>(
		&self,
		account_id: &str,
		signed_payload: Option<&SignedPayload<T>>,
		client_signature: &str,
	) -> Result<bool, SignatureError> {
		if account_id.trim().is_empty() {
			return Err(self.signatures.precondition_failed("account id is required"));
		}
		self.signatures.check_inputs(signed_payload, client_signature)?;

		let account = self.directory.resolve(account_id).await?;
		let client_key = PublicKey::from_account_key(&account.key)?;

		self.signatures
			.verify_client_signature_with_key(&client_key, signed_payload, client_signature)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::observer::VerificationObserver;
	use login_account::{implementations::local::LocalSigner, PrivateKey};
	use login_directory::implementations::memory::MemoryDirectory;
	use login_types::{VerificationEvent, VerificationStage};
	use serde_json::{json, Value};
	use std::sync::Mutex;

	const SERVER_SEED: &str = "db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10";

	#[derive(Default)]
	struct RecordingObserver(Mutex<Vec<VerificationEvent>>);

	impl VerificationObserver for RecordingObserver {
		fn on_event(&self, event: &VerificationEvent) {
			self.0.lock().unwrap().push(event.clone());
		}
	}

	fn config() -> Config {
		format!(
			r#"
[server]
domain_url = "https://app.example.com"

[signer]
primary = "local"
[signer.implementations.local]
private_key = "{SERVER_SEED}"

[directory]
primary = "memory"
[directory.implementations.memory]
"#
		)
		.parse()
		.unwrap()
	}

	#[tokio::test]
	async fn test_account_preconditions_reach_observer() {
		let observer = Arc::new(RecordingObserver::default());
		let key: PrivateKey = SERVER_SEED.parse().unwrap();
		let signatures =
			SignatureService::new(Box::new(LocalSigner::new(key)), "https://app.example.com")
				.with_observer(observer.clone());
		let engine = LoginEngine::new(
			config(),
			Arc::new(signatures),
			Arc::new(DirectoryService::new(Box::new(MemoryDirectory::new()))),
		);
		let signed = engine
			.create_signing_envelope(json!({"login": true}))
			.unwrap()
			.into_signed_payload();

		let results = [
			engine
				.verify_account_signature("", Some(&signed), "AAAA")
				.await,
			engine
				.verify_account_signature::<Value>("0.0.1001", None, "AAAA")
				.await,
			engine
				.verify_account_signature("0.0.1001", Some(&signed), " ")
				.await,
		];
		for result in results {
			assert!(matches!(result, Err(SignatureError::InvalidArgument(_))));
		}

		let events = observer.0.lock().unwrap().clone();
		assert_eq!(events.len(), 4);
		assert!(events[1..].iter().all(|event| matches!(
			event,
			VerificationEvent::VerificationRejected {
				stage: VerificationStage::Preconditions,
				..
			}
		)));
	}
}
