//! Schema flattening - transforms model-derived JSON Schemas into the
//! restricted dialect LLM function-calling interfaces accept.
//!
//! One recursive top-down pass inlines `#/$defs/` references, collapses
//! `anyOf`/`oneOf`/`allOf` unions, strips unsupported keywords, and infers
//! `items` for array nodes. A separate final pass marks non-required
//! properties with an `(Optional)` description prefix.

use std::collections::{BTreeSet, HashSet};

use serde_json::{json, Map, Value};

use crate::annotate::annotate_optional;
use crate::error::FlattenError;
use crate::types::{
    branch_type_name, json_type_name, local_ref_name, UNION_KEYWORDS, UNSUPPORTED_KEYWORDS,
};

/// Flatten a JSON Schema for function-calling compatibility.
///
/// The output contains no `$ref`/`$defs`, no union keywords, none of the
/// [`UNSUPPORTED_KEYWORDS`], every array node carries `items`, and every
/// non-required property description starts with `(Optional)`.
///
/// Degenerate constructs degrade locally and leave a textual trace:
/// unknown `$ref` targets are dropped, cycles become a
/// `(recursive: <name>)` placeholder, and multi-branch unions collapse to
/// their first branch with a `(Union of: ...)` note.
///
/// # Errors
///
/// Returns `FlattenError::RootNotObject` if the schema root is not an
/// object, or `FlattenError::RefNotString` if any `$ref` value is not a
/// string. All other degradations are non-fatal.
pub fn flatten(schema: &Value) -> Result<Value, FlattenError> {
    if !schema.is_object() {
        return Err(FlattenError::RootNotObject {
            actual: json_type_name(schema).to_string(),
        });
    }

    let defs = Map::new();
    let seen = HashSet::new();
    let mut flattened = inline_value(schema, &defs, &seen, "")?;
    annotate_optional(&mut flattened);
    Ok(flattened)
}

// --- Internal implementation ---

fn inline_value(
    value: &Value,
    defs: &Map<String, Value>,
    seen: &HashSet<String>,
    path: &str,
) -> Result<Value, FlattenError> {
    match value {
        Value::Object(map) => inline_object(map, defs, seen, path),
        Value::Array(arr) => {
            let mut result = Vec::with_capacity(arr.len());
            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}/{}", path, i);
                result.push(inline_value(item, defs, seen, &item_path)?);
            }
            Ok(Value::Array(result))
        }
        // Primitives pass through unchanged
        other => Ok(other.clone()),
    }
}

fn inline_object(
    map: &Map<String, Value>,
    defs: &Map<String, Value>,
    seen: &HashSet<String>,
    path: &str,
) -> Result<Value, FlattenError> {
    // A nested $defs shadows same-named outer entries for this subtree
    // only; the caller's table is never mutated.
    let merged;
    let defs = match map.get("$defs") {
        Some(Value::Object(local)) => {
            let mut table = defs.clone();
            for (name, def) in local {
                table.insert(name.clone(), def.clone());
            }
            merged = table;
            &merged
        }
        _ => defs,
    };

    if let Some(ref_val) = map.get("$ref") {
        let Some(ref_str) = ref_val.as_str() else {
            return Err(FlattenError::RefNotString {
                path: format!("{}/$ref", path),
                actual: json_type_name(ref_val).to_string(),
            });
        };
        if let Some(name) = local_ref_name(ref_str) {
            if let Some(target) = defs.get(name) {
                return inline_ref(name, target, map, defs, seen, path);
            }
        }
        // Unknown or non-local target: fall through so the keyword filter
        // drops the ref and the resolved siblings survive.
    }

    for &union_key in UNION_KEYWORDS {
        if let Some(Value::Array(branches)) = map.get(union_key) {
            return simplify_union(union_key, branches, map, defs, seen, path);
        }
    }

    inline_plain(map, defs, seen, path)
}

/// Inline a resolvable `#/$defs/<name>` reference.
///
/// Sibling keys of the `$ref` node overlay the inlined definition, winning
/// on collision. A name already on the current recursion path becomes a
/// `(recursive: <name>)` placeholder instead of recursing further.
fn inline_ref(
    name: &str,
    target: &Value,
    map: &Map<String, Value>,
    defs: &Map<String, Value>,
    seen: &HashSet<String>,
    path: &str,
) -> Result<Value, FlattenError> {
    let siblings = resolved_siblings(map, defs, seen, path)?;

    if seen.contains(name) {
        let mut node = Map::new();
        node.insert("type".to_string(), Value::String("object".to_string()));
        node.insert(
            "description".to_string(),
            Value::String(format!("(recursive: {})", name)),
        );
        for (key, value) in siblings {
            node.insert(key, value);
        }
        return Ok(Value::Object(node));
    }

    let mut child_seen = seen.clone();
    child_seen.insert(name.to_string());
    let inlined = inline_value(target, defs, &child_seen, path)?;

    let mut node = match inlined {
        Value::Object(m) => m,
        // A definition that resolves to a non-object fragment cannot take
        // a sibling overlay; return it as-is when there is nothing to merge.
        other => {
            if siblings.is_empty() {
                return Ok(other);
            }
            Map::new()
        }
    };
    for (key, value) in siblings {
        node.insert(key, value);
    }
    Ok(Value::Object(node))
}

/// Collapse a union node into one concrete node.
fn simplify_union(
    union_key: &str,
    branches: &[Value],
    map: &Map<String, Value>,
    defs: &Map<String, Value>,
    seen: &HashSet<String>,
    path: &str,
) -> Result<Value, FlattenError> {
    let non_null: Vec<&Value> = branches
        .iter()
        .filter(|b| b.is_object() && b.get("type").and_then(|t| t.as_str()) != Some("null"))
        .collect();
    let has_null = branches
        .iter()
        .any(|b| b.get("type").and_then(|t| t.as_str()) == Some("null"));

    let sibling_description = map
        .get("description")
        .and_then(|d| d.as_str())
        .map(String::from);

    let mut result = resolved_siblings(map, defs, seen, path)?;

    if non_null.is_empty() {
        // Degenerate union: nothing concrete to represent. The dialect has
        // no empty/null type, so default to string.
        if !result.contains_key("type") {
            result.insert("type".to_string(), Value::String("string".to_string()));
        }
        if has_null {
            result.insert("nullable".to_string(), Value::Bool(true));
        }
        return Ok(Value::Object(result));
    }

    if union_key == "allOf" {
        for branch in &non_null {
            let Value::Object(mut branch_map) = inline_value(branch, defs, seen, path)? else {
                continue;
            };
            let branch_props = branch_map.remove("properties");
            let branch_required = branch_map.remove("required");

            // Later branch wins on top-level key collision
            for (key, value) in branch_map {
                result.insert(key, value);
            }

            if let Some(Value::Object(props)) = branch_props {
                let merged = result
                    .entry("properties".to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(existing) = merged {
                    for (name, prop) in props {
                        existing.insert(name, prop);
                    }
                }
            }

            if let Some(Value::Array(required)) = branch_required {
                let mut names: BTreeSet<String> = result
                    .get("required")
                    .and_then(|r| r.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default();
                names.extend(required.iter().filter_map(|v| v.as_str().map(String::from)));
                result.insert(
                    "required".to_string(),
                    Value::Array(names.into_iter().map(Value::String).collect()),
                );
            }
        }

        // Sibling description wins over any branch description
        if let Some(desc) = sibling_description {
            result.insert("description".to_string(), Value::String(desc));
        }
    } else {
        // anyOf/oneOf: the dialect cannot express true unions, so the
        // first branch stands in for all of them.
        if let Value::Object(representative) = inline_value(non_null[0], defs, seen, path)? {
            for (key, value) in representative {
                result.insert(key, value);
            }
        }

        if non_null.len() > 1 {
            let type_names: Vec<String> = non_null.iter().map(|b| branch_type_name(b)).collect();
            let union_note = format!("(Union of: {})", type_names.join(", "));
            let description = match &sibling_description {
                Some(desc) if !desc.is_empty() => format!("{} {}", desc, union_note),
                _ => union_note,
            };
            result.insert("description".to_string(), Value::String(description));
        } else if let Some(desc) = sibling_description {
            result.insert("description".to_string(), Value::String(desc));
        }
    }

    // Set only when a null branch was explicitly present - never merely
    // because the field is optional.
    if has_null {
        result.insert("nullable".to_string(), Value::Bool(true));
    }

    Ok(Value::Object(result))
}

/// Copy a node through the keyword filter, recursing into children.
fn inline_plain(
    map: &Map<String, Value>,
    defs: &Map<String, Value>,
    seen: &HashSet<String>,
    path: &str,
) -> Result<Value, FlattenError> {
    // Capture before filtering: tuple schemas lend their first element to
    // the items inference below.
    let prefix_items = map.get("prefixItems").and_then(|v| v.as_array());

    let mut result = Map::new();
    for (key, value) in map {
        if UNSUPPORTED_KEYWORDS.contains(&key.as_str()) {
            continue;
        }
        result.insert(key.clone(), inline_entry(key, value, defs, seen, path)?);
    }

    // Every array node must declare items
    if result.get("type").and_then(|t| t.as_str()) == Some("array")
        && !result.contains_key("items")
    {
        let items = match prefix_items.and_then(|p| p.first()) {
            Some(first) => {
                let item_path = format!("{}/prefixItems/0", path);
                inline_value(first, defs, seen, &item_path)?
            }
            None => json!({ "type": "string" }),
        };
        result.insert("items".to_string(), items);
    }

    Ok(Value::Object(result))
}

/// Recurse into one key's value. Property names are data, never schema
/// keywords, so `properties` maps recurse into their values only.
fn inline_entry(
    key: &str,
    value: &Value,
    defs: &Map<String, Value>,
    seen: &HashSet<String>,
    path: &str,
) -> Result<Value, FlattenError> {
    let child_path = format!("{}/{}", path, key);

    if key == "properties" {
        if let Value::Object(props) = value {
            let mut result = Map::new();
            for (name, prop) in props {
                let prop_path = format!("{}/{}", child_path, name);
                result.insert(name.clone(), inline_value(prop, defs, seen, &prop_path)?);
            }
            return Ok(Value::Object(result));
        }
    }

    inline_value(value, defs, seen, &child_path)
}

/// Resolve the sibling keys of a `$ref` or union node: everything except
/// unsupported keywords and the union keywords themselves.
fn resolved_siblings(
    map: &Map<String, Value>,
    defs: &Map<String, Value>,
    seen: &HashSet<String>,
    path: &str,
) -> Result<Map<String, Value>, FlattenError> {
    let mut result = Map::new();
    for (key, value) in map {
        if UNSUPPORTED_KEYWORDS.contains(&key.as_str()) || UNION_KEYWORDS.contains(&key.as_str()) {
            continue;
        }
        result.insert(key.clone(), inline_entry(key, value, defs, seen, path)?);
    }
    Ok(result)
}
