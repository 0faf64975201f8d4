//! Request processing for the login API endpoints.
//!
//! Handlers in `server` extract the request and delegate here; errors from
//! the core are translated into [`APIError`]s with a stable `error` code.

pub mod account;
pub mod payload;
pub mod verify;

use login_core::SignatureError;
use login_directory::DirectoryError;
use login_types::APIError;

/// Maps a directory failure to its HTTP form.
pub fn directory_error(error: DirectoryError) -> APIError {
	let message = error.to_string();
	match error {
		DirectoryError::NotFound(_) => APIError::NotFound {
			error_type: "ACCOUNT_NOT_FOUND".to_string(),
			message,
		},
		DirectoryError::MissingKey(_) => APIError::UnprocessableEntity {
			error_type: "MISSING_KEY".to_string(),
			message,
		},
		DirectoryError::UnsupportedKeyType { .. } => APIError::UnprocessableEntity {
			error_type: "UNSUPPORTED_KEY_TYPE".to_string(),
			message,
		},
		DirectoryError::Transport(_) | DirectoryError::InvalidResponse(_) => APIError::BadGateway {
			error_type: "DIRECTORY_UNAVAILABLE".to_string(),
			message,
		},
		DirectoryError::Configuration(_) => APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message,
		},
	}
}

/// Maps a signature failure to its HTTP form.
///
/// A key that fails to parse is the caller's fault when the caller supplied
/// it and the directory's fault when it was resolved from an account, so
/// the caller says which.
pub fn signature_error(error: SignatureError, key_from_directory: bool) -> APIError {
	let message = error.to_string();
	match error {
		SignatureError::InvalidArgument(_) | SignatureError::Canonical(_) => APIError::BadRequest {
			error_type: "INVALID_ARGUMENT".to_string(),
			message,
		},
		SignatureError::UnauthorizedPayload => APIError::Unauthorized {
			error_type: "UNAUTHORIZED_PAYLOAD".to_string(),
			message,
		},
		SignatureError::Key(_) if key_from_directory => APIError::UnprocessableEntity {
			error_type: "INVALID_ACCOUNT_KEY".to_string(),
			message,
		},
		SignatureError::Key(_) => APIError::BadRequest {
			error_type: "INVALID_PUBLIC_KEY".to_string(),
			message,
		},
		SignatureError::Directory(e) => directory_error(e),
		SignatureError::Uninitialized => uninitialized(),
		SignatureError::Signer(_) => APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message,
		},
	}
}

/// Error returned while no engine is installed.
pub fn uninitialized() -> APIError {
	APIError::ServiceUnavailable {
		error_type: "UNINITIALIZED".to_string(),
		message: SignatureError::Uninitialized.to_string(),
	}
}
