//! Deterministic JSON encoding.
//!
//! Both signatures in the handshake are computed over the output of
//! [`canonicalize`]. Two structurally equal values always encode to the same
//! bytes: object keys are emitted in byte order of their UTF-8 encoding,
//! arrays keep their element order, and scalars use plain JSON encoding.
//! The key sort happens here rather than relying on `serde_json::Map`, whose
//! iteration order changes when the `preserve_order` feature is enabled
//! anywhere in the dependency graph.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while converting a value into canonical form.
#[derive(Debug, Error)]
pub enum CanonicalError {
	/// The value has no JSON representation (e.g. a map with non-string keys).
	#[error("Value is not representable as JSON: {0}")]
	Unrepresentable(String),
}

/// Capability of being encoded by the canonical encoder.
///
/// Every `Serialize` type gets this through the blanket implementation; the
/// trait exists so signing APIs can name the bound they actually rely on.
pub trait Canonicalizable {
	/// Converts `self` into the JSON value model.
	fn to_canonical_value(&self) -> Result<Value, CanonicalError>;

	/// Encodes `self` into canonical bytes.
	fn to_canonical_bytes(&self) -> Result<Vec<u8>, CanonicalError> {
		self.to_canonical_value().map(|value| canonicalize(&value))
	}
}

impl<T: Serialize + ?Sized> Canonicalizable for T {
	fn to_canonical_value(&self) -> Result<Value, CanonicalError> {
		serde_json::to_value(self).map_err(|e| CanonicalError::Unrepresentable(e.to_string()))
	}
}

/// Encodes a JSON value into its canonical byte sequence.
pub fn canonicalize(value: &Value) -> Vec<u8> {
	let mut out = Vec::new();
	write_value(value, &mut out);
	out
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
	match value {
		Value::Array(items) => {
			out.push(b'[');
			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(b',');
				}
				write_value(item, out);
			}
			out.push(b']');
		},
		Value::Object(map) => {
			let mut entries: Vec<(&String, &Value)> = map.iter().collect();
			entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

			out.push(b'{');
			for (i, (key, item)) in entries.into_iter().enumerate() {
				if i > 0 {
					out.push(b',');
				}
				out.extend_from_slice(Value::from(key.as_str()).to_string().as_bytes());
				out.push(b':');
				write_value(item, out);
			}
			out.push(b'}');
		},
		// Compact `Display` of a scalar is its standard JSON encoding.
		scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
	}
}
