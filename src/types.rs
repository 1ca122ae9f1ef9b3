//! Core types and keyword tables for schema flattening.

use serde_json::Value;

/// JSON Schema keywords the function-calling dialect does not accept.
///
/// These are stripped from every node during flattening. `$ref`/`$defs`
/// are resolved (not just dropped) before this filter applies.
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "$defs",
    "$ref",
    "default",
    "title",
    "additionalProperties",
    "const",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minItems",
    "maxItems",
    "minLength",
    "maxLength",
    "pattern",
    "uniqueItems",
    "examples",
    "prefixItems",
];

/// JSON Schema union keywords, in the order they are tried.
pub const UNION_KEYWORDS: &[&str] = &["anyOf", "oneOf", "allOf"];

/// Description prefix stamped on non-required properties.
pub const OPTIONAL_MARKER: &str = "(Optional)";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract the definition name from a local `$ref` token.
///
/// Only `#/$defs/<name>` refs are resolvable; anything else (external
/// files, URLs, `#`, deeper pointers) returns `None`.
pub fn local_ref_name(ref_val: &str) -> Option<&str> {
    let name = ref_val.strip_prefix("#/$defs/")?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(name)
}

/// Human-readable type label for a union branch.
///
/// Prefers the branch's `type`, falls back to the last segment of its
/// `$ref`, then `"unknown"`. Used for `(Union of: ...)` notes.
pub fn branch_type_name(branch: &Value) -> String {
    if let Some(t) = branch.get("type") {
        return match t {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    if let Some(ref_val) = branch.get("$ref").and_then(|v| v.as_str()) {
        if ref_val.contains('/') {
            if let Some(name) = ref_val.rsplit('/').next() {
                return name.to_string();
            }
        }
    }
    "unknown".to_string()
}
