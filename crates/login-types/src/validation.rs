//! Configuration validation for pluggable implementations.
//!
//! Each signer and directory implementation exposes a [`ConfigSchema`] that
//! checks its raw TOML table before the implementation is constructed, so a
//! misconfigured deployment fails at startup with a field-level message.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// At most one of the listed fields may be set, and at least one must be.
	#[error("Exactly one of {0:?} must be set")]
	Exclusive(Vec<String>),
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// An `http://` or `https://` URL.
	Url,
	/// A table whose values are validated individually by the field's validator.
	Table,
}

/// Custom validation run after the type check succeeds.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a validator returning an error message on failure.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Validation schema for one implementation's TOML table.
#[derive(Debug, Default)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
	/// Groups of optional fields of which exactly one must be present.
	pub exclusive: Vec<Vec<String>>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self {
			required,
			optional,
			exclusive: Vec::new(),
		}
	}

	/// Requires exactly one of `names` to be present.
	pub fn with_exclusive(mut self, names: &[&str]) -> Self {
		self.exclusive
			.push(names.iter().map(|n| n.to_string()).collect());
		self
	}

	/// Validates a TOML value against this schema.
	///
	/// Required fields must be present; every present field must have the
	/// declared type and pass its validator.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		for group in &self.exclusive {
			let present = group.iter().filter(|n| table.contains_key(*n)).count();
			if present != 1 {
				return Err(ValidationError::Exclusive(group.clone()));
			}
		}

		Ok(())
	}
}

fn type_mismatch(field: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn check_type(
	field: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	match expected {
		FieldType::String => {
			value
				.as_str()
				.ok_or_else(|| type_mismatch(field, "string", value))?;
		},
		FieldType::Integer { min, max } => {
			let n = value
				.as_integer()
				.ok_or_else(|| type_mismatch(field, "integer", value))?;
			if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: format!("Value {} is outside [{:?}, {:?}]", n, min, max),
				});
			}
		},
		FieldType::Url => {
			let url = value
				.as_str()
				.ok_or_else(|| type_mismatch(field, "url", value))?;
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: format!("'{}' is not an http(s) URL", url),
				});
			}
		},
		FieldType::Table => {
			value
				.as_table()
				.ok_or_else(|| type_mismatch(field, "table", value))?;
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
