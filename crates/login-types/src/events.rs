//! Event types emitted while envelopes are created and verified.
//!
//! Events are handed to an observer installed on the signature service so
//! that verification outcomes can be logged or counted without the service
//! itself writing any output.

use serde::{Deserialize, Serialize};

/// Step of the verification protocol an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStage {
	/// Parameter presence checks, before any cryptographic work.
	Preconditions,
	/// Stage 1: the envelope was produced by this server.
	ServerSignature,
	/// Stage 2: the client approved this exact envelope.
	ClientSignature,
}

/// Events produced by the signature service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationEvent {
	/// A signing envelope was created for the given origin.
	EnvelopeCreated { url: String },
	/// Stage 1 completed.
	ServerSignatureChecked { valid: bool },
	/// Stage 2 completed.
	ClientSignatureChecked {
		valid: bool,
		client_public_key: String,
	},
	/// A verification call terminated with an error at the given stage.
	VerificationRejected {
		stage: VerificationStage,
		reason: String,
	},
}
