//! Observability hook for the signature service.

use login_types::{VerificationEvent, VerificationStage};

/// Receives events as envelopes are created and verified.
///
/// Observers run synchronously inside the verification call and must not
/// block.
pub trait VerificationObserver: Send + Sync {
	fn on_event(&self, event: &VerificationEvent);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl VerificationObserver for NoopObserver {
	fn on_event(&self, _event: &VerificationEvent) {}
}

/// Observer that forwards events to `tracing`.
///
/// Rejections are logged at `warn`, successful checks at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl VerificationObserver for TracingObserver {
	fn on_event(&self, event: &VerificationEvent) {
		match event {
			VerificationEvent::EnvelopeCreated { url } => {
				tracing::debug!(%url, "Created signing envelope");
			},
			VerificationEvent::ServerSignatureChecked { valid } => {
				tracing::debug!(valid, "Checked server signature");
			},
			VerificationEvent::ClientSignatureChecked {
				valid,
				client_public_key,
			} => {
				tracing::info!(valid, client = %client_public_key, "Checked client signature");
			},
			VerificationEvent::VerificationRejected { stage, reason } => match stage {
				VerificationStage::Preconditions => {
					tracing::debug!(?stage, %reason, "Verification rejected");
				},
				_ => tracing::warn!(?stage, %reason, "Verification rejected"),
			},
		}
	}
}
