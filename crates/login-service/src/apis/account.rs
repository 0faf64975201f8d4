//! Account lookup endpoint.

use super::directory_error;
use login_core::LoginEngine;
use login_types::{APIError, AccountKeyInfo};

/// Resolves an account to its current key through the configured directory.
pub async fn get_account(account_id: &str, engine: &LoginEngine) -> Result<AccountKeyInfo, APIError> {
	tracing::debug!(account_id, "Resolving account");
	engine
		.resolve_account(account_id)
		.await
		.map_err(directory_error)
}
