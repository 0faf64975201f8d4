//! Envelope creation endpoint.

use super::signature_error;
use login_core::LoginEngine;
use login_types::{APIError, CreatePayloadRequest, SigningEnvelope};
use serde_json::Value;

/// Creates a server-signed envelope around the requested data.
pub fn create_payload(
	request: CreatePayloadRequest,
	engine: &LoginEngine,
) -> Result<SigningEnvelope<Value>, APIError> {
	engine
		.create_signing_envelope(request.data)
		.map_err(|e| signature_error(e, false))
}
