//! Optional-field annotation - the final flattening pass.
//!
//! After flattening strips `anyOf` and `default`, the only signal that a
//! field is optional is its absence from the `required` array. LLMs
//! frequently overlook this, so every non-required property gets an
//! `(Optional)` description prefix as a natural-language hint.
//!
//! `nullable: true` is deliberately **not** set here. Non-required does
//! not imply nullable: a field with a default can be omitted but does not
//! accept null. The `nullable` flag is set during union simplification,
//! when a null branch is actually present.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::OPTIONAL_MARKER;

/// Prefix non-required property descriptions with `(Optional)`.
///
/// Walks top-down over a flattened schema. Recurses into nested object
/// properties (each using its own `required`) and one level into the
/// `items` of array-typed properties when the items schema is itself an
/// object with properties. Edits descriptions only; idempotent.
pub fn annotate_optional(schema: &mut Value) {
    let Some(node) = schema.as_object_mut() else {
        return;
    };

    let required: HashSet<String> = node
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let Some(Value::Object(props)) = node.get_mut("properties") else {
        return;
    };

    for (name, prop) in props.iter_mut() {
        let Some(prop_map) = prop.as_object_mut() else {
            continue;
        };

        if !required.contains(name) {
            let description = prop_map
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("");
            if !description.starts_with(OPTIONAL_MARKER) {
                let annotated = if description.is_empty() {
                    OPTIONAL_MARKER.to_string()
                } else {
                    format!("{} {}", OPTIONAL_MARKER, description)
                };
                prop_map.insert("description".to_string(), Value::String(annotated));
            }
        }

        let prop_type = prop_map.get("type").and_then(|t| t.as_str());
        let is_nested_object = prop_type == Some("object") && prop_map.contains_key("properties");
        let is_array = prop_type == Some("array");

        if is_nested_object {
            annotate_optional(prop);
        } else if is_array {
            if let Some(items) = prop.get_mut("items") {
                let is_object_items = items.get("type").and_then(|t| t.as_str()) == Some("object")
                    && items.get("properties").is_some();
                if is_object_items {
                    annotate_optional(items);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn marks_non_required_property() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "name": { "type": "string", "description": "Display name" }
            },
            "required": ["id"]
        });
        annotate_optional(&mut schema);

        assert!(schema["properties"]["id"].get("description").is_none());
        assert_eq!(
            schema["properties"]["name"]["description"],
            "(Optional) Display name"
        );
    }

    #[test]
    fn bare_optional_marker_when_no_description() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "note": { "type": "string" }
            }
        });
        annotate_optional(&mut schema);

        assert_eq!(schema["properties"]["note"]["description"], "(Optional)");
    }

    #[test]
    fn idempotent_on_already_marked() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "note": { "type": "string", "description": "(Optional) A note" }
            }
        });
        annotate_optional(&mut schema);

        assert_eq!(
            schema["properties"]["note"]["description"],
            "(Optional) A note"
        );
    }

    #[test]
    fn recurses_into_nested_objects_with_own_required() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {
                        "street": { "type": "string" },
                        "unit": { "type": "string" }
                    },
                    "required": ["street"]
                }
            },
            "required": ["address"]
        });
        annotate_optional(&mut schema);

        let address = &schema["properties"]["address"];
        assert!(address.get("description").is_none());
        assert!(address["properties"]["street"].get("description").is_none());
        assert_eq!(address["properties"]["unit"]["description"], "(Optional)");
    }

    #[test]
    fn recurses_one_level_into_array_of_objects() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "rows": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "value": { "type": "number" },
                            "label": { "type": "string" }
                        },
                        "required": ["value"]
                    }
                }
            },
            "required": ["rows"]
        });
        annotate_optional(&mut schema);

        let items = &schema["properties"]["rows"]["items"];
        assert!(items["properties"]["value"].get("description").is_none());
        assert_eq!(items["properties"]["label"]["description"], "(Optional)");
    }

    #[test]
    fn scalar_array_items_untouched() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            }
        });
        annotate_optional(&mut schema);

        assert_eq!(schema["properties"]["tags"]["description"], "(Optional)");
        assert_eq!(schema["properties"]["tags"]["items"], json!({ "type": "string" }));
    }

    #[test]
    fn never_touches_nullable() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "count": { "type": "integer", "nullable": true }
            }
        });
        annotate_optional(&mut schema);

        assert_eq!(schema["properties"]["count"]["nullable"], true);
        assert_eq!(schema["properties"]["count"]["description"], "(Optional)");
    }
}
