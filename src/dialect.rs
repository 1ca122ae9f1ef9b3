//! Function-calling dialect conformance checks.
//!
//! Walks a schema and reports every construct the dialect rejects:
//! remaining `$ref`/`$defs`, union keywords, other unsupported keywords,
//! and array nodes without `items`. [`flatten`](crate::flatten) output
//! always passes; the checker exists to audit schemas produced elsewhere
//! and to back the `check` CLI subcommand.

use serde_json::Value;

use crate::error::SchemaError;
use crate::types::{UNION_KEYWORDS, UNSUPPORTED_KEYWORDS};

/// Collect every dialect violation in a schema.
///
/// Returns an empty vector when the schema already satisfies the
/// function-calling dialect.
pub fn check_dialect(schema: &Value) -> Vec<SchemaError> {
    let mut violations = Vec::new();
    check_node(schema, "", &mut violations);
    violations
}

/// Returns true if the schema satisfies the function-calling dialect.
pub fn is_flat(schema: &Value) -> bool {
    check_dialect(schema).is_empty()
}

fn check_node(value: &Value, path: &str, violations: &mut Vec<SchemaError>) {
    match value {
        Value::Object(map) => {
            for key in map.keys() {
                if UNSUPPORTED_KEYWORDS.contains(&key.as_str()) {
                    push(violations, &format!("{}/{}", path, key), format!(
                        "unsupported keyword \"{}\"",
                        key
                    ));
                } else if UNION_KEYWORDS.contains(&key.as_str()) {
                    push(violations, &format!("{}/{}", path, key), format!(
                        "union keyword \"{}\" not collapsed",
                        key
                    ));
                }
            }

            if map.get("type").and_then(|t| t.as_str()) == Some("array")
                && !map.contains_key("items")
            {
                push(violations, path, "array node missing items".to_string());
            }

            for (key, child) in map {
                if key == "properties" {
                    // Property names are data, not keywords
                    if let Value::Object(props) = child {
                        for (name, prop) in props {
                            let prop_path = format!("{}/properties/{}", path, name);
                            check_node(prop, &prop_path, violations);
                        }
                        continue;
                    }
                }
                check_node(child, &format!("{}/{}", path, key), violations);
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                check_node(item, &format!("{}/{}", path, i), violations);
            }
        }
        _ => {}
    }
}

fn push(violations: &mut Vec<SchemaError>, path: &str, message: String) {
    let path = if path.is_empty() { "/" } else { path };
    violations.push(SchemaError {
        path: path.to_string(),
        message,
    });
}
