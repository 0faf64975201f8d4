//! Client signature verification endpoint.
//!
//! The client key is either given directly or looked up by account id.
//! Exactly one of the two must be present.

use super::signature_error;
use login_core::LoginEngine;
use login_types::{APIError, VerifyRequest, VerifyResponse};

/// Runs both verification stages for the request.
///
/// A signature that does not verify is a successful call answering
/// `verified: false`; only malformed or forged requests are errors.
pub async fn verify_signature(
	request: VerifyRequest,
	engine: &LoginEngine,
) -> Result<VerifyResponse, APIError> {
	let VerifyRequest {
		public_key,
		account_id,
		signed_payload,
		signature,
	} = request;

	let verified = match (public_key, account_id.as_deref()) {
		(Some(public_key), None) => engine
			.signatures()
			.verify_client_signature(&public_key, signed_payload.as_ref(), &signature)
			.map_err(|e| signature_error(e, false))?,
		(None, Some(account_id)) => engine
			.verify_account_signature(account_id, signed_payload.as_ref(), &signature)
			.await
			.map_err(|e| signature_error(e, true))?,
		_ => {
			return Err(APIError::BadRequest {
				error_type: "INVALID_ARGUMENT".to_string(),
				message: "exactly one of publicKey or accountId is required".to_string(),
			})
		},
	};

	if !verified {
		tracing::info!(account_id = ?account_id, "Client signature rejected");
	}

	Ok(VerifyResponse {
		verified,
		account_id,
	})
}
