//! API types for the login server's HTTP endpoints.

use crate::SignedPayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Body of `POST /api/payloads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayloadRequest {
	/// Content to attest. Any JSON value is accepted.
	pub data: Value,
}

/// Body of `POST /api/verify`.
///
/// The client key is given either directly as `publicKey` or indirectly as
/// `accountId`, in which case it is resolved through the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
	#[serde(default)]
	pub public_key: Option<String>,
	#[serde(default)]
	pub account_id: Option<String>,
	#[serde(default)]
	pub signed_payload: Option<SignedPayload<Value>>,
	/// Base64 client signature over the canonical `signedPayload`.
	#[serde(default)]
	pub signature: String,
}

/// Response of `POST /api/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
	/// Whether the client signed exactly the server-issued envelope.
	pub verified: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub account_id: Option<String>,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Machine-readable error kind.
	pub error: String,
	pub message: String,
}

/// API errors mapped to HTTP statuses.
#[derive(Debug, Clone)]
pub enum APIError {
	/// 400: malformed request or missing parameters.
	BadRequest { error_type: String, message: String },
	/// 401: the envelope was not issued by this server.
	Unauthorized { error_type: String, message: String },
	/// 404: unknown account.
	NotFound { error_type: String, message: String },
	/// 422: well-formed request the directory data cannot satisfy.
	UnprocessableEntity { error_type: String, message: String },
	/// 502: the directory service failed or answered garbage.
	BadGateway { error_type: String, message: String },
	/// 500: anything else.
	InternalServerError { error_type: String, message: String },
	/// 503: the login engine is not available yet.
	ServiceUnavailable { error_type: String, message: String },
}

impl APIError {
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Unauthorized { .. } => 401,
			APIError::NotFound { .. } => 404,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::BadGateway { .. } => 502,
			APIError::InternalServerError { .. } => 500,
			APIError::ServiceUnavailable { .. } => 503,
		}
	}

	fn parts(&self) -> (&str, &str) {
		match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::Unauthorized {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
			}
			| APIError::BadGateway {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			}
			| APIError::ServiceUnavailable {
				error_type,
				message,
			} => (error_type.as_str(), message.as_str()),
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = self.parts();
		ErrorResponse {
			error: error_type.to_string(),
			message: message.to_string(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (error_type, message) = self.parts();
		write!(f, "{} ({}): {}", self.status_code(), error_type, message)
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_verify_request_accepts_missing_fields() {
		let request: VerifyRequest =
			serde_json::from_value(json!({"accountId": "0.0.1001"})).unwrap();
		assert_eq!(request.account_id.as_deref(), Some("0.0.1001"));
		assert!(request.public_key.is_none());
		assert!(request.signed_payload.is_none());
		assert!(request.signature.is_empty());
	}

	#[test]
	fn test_api_error_mapping() {
		let err = APIError::Unauthorized {
			error_type: "UNAUTHORIZED_PAYLOAD".to_string(),
			message: "server signature mismatch".to_string(),
		};
		assert_eq!(err.status_code(), 401);
		assert_eq!(err.to_error_response().error, "UNAUTHORIZED_PAYLOAD");
		assert!(err.to_string().starts_with("401"));
	}
}
