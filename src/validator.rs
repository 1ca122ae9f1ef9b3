//! Payload validation against schemas.
//!
//! A tool server advertises the flattened schema but validates incoming
//! arguments with a real JSON Schema validator. `validate` flattens first
//! so the check matches what the model was shown; `validate_against_schema`
//! takes the schema as-is.

use serde_json::Value;

use crate::error::{FlattenError, SchemaError, ValidateError};
use crate::flatten::flatten;

/// Validate a payload against the flattened form of a schema.
///
/// # Errors
///
/// Returns `ValidateError::Flatten` if flattening fails, or
/// `ValidateError::Invalid` if the payload doesn't match the flattened
/// schema.
pub fn validate(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let flattened = flatten(schema)?;
    validate_against_schema(&flattened, payload)
}

/// Validate a payload against a schema as-is.
///
/// Use this when the schema is already flattened, or when the original
/// schema's constraint keywords (min/max, pattern) should still apply.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| {
        ValidateError::Flatten(FlattenError::InvalidSchema {
            message: e.to_string(),
        })
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
