//! Function-Calling Schema Flattener
//!
//! Transforms JSON Schemas generated from typed data models (with
//! `$ref`/`$defs` indirection, `anyOf`/`oneOf`/`allOf` unions, and
//! constraint keywords) into the restricted dialect LLM function-calling
//! interfaces accept: no refs, no unions, arrays always declare `items`,
//! and optionality is signaled redundantly in description text.
//!
//! # Example
//!
//! ```
//! use fc_schema::flatten;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "$defs": {
//!         "Address": {
//!             "type": "object",
//!             "properties": { "city": { "type": "string" } },
//!             "required": ["city"]
//!         }
//!     },
//!     "type": "object",
//!     "properties": {
//!         "id": { "type": "string" },
//!         "count": { "anyOf": [{ "type": "integer" }, { "type": "null" }] },
//!         "home": { "$ref": "#/$defs/Address" }
//!     },
//!     "required": ["id", "home"]
//! });
//!
//! let flat = flatten(&schema).unwrap();
//!
//! // References are inlined, unions collapsed, optionality spelled out
//! assert_eq!(flat["properties"]["home"]["type"], "object");
//! assert_eq!(flat["properties"]["count"]["nullable"], true);
//! assert_eq!(flat["properties"]["count"]["description"], "(Optional)");
//! assert!(flat.get("$defs").is_none());
//! ```
//!
//! # Lossy Approximations
//!
//! The dialect cannot express everything a generated schema can, so the
//! flattener degrades deliberately and leaves a textual trace:
//!
//! | Construct | Result |
//! |-----------|--------|
//! | `anyOf`/`oneOf` with 2+ non-null branches | first branch + `(Union of: ...)` note |
//! | recursive `$ref` | `{type: "object", description: "(recursive: <name>)"}` |
//! | unknown `$ref` target | reference dropped, siblings kept |
//! | empty union | `type: "string"` |
//! | tuple `prefixItems` | `items` from the first element |
//!
//! Only malformed input (non-object root, non-string `$ref`) is a hard
//! error.

mod annotate;
mod dialect;
mod error;
mod flatten;
mod linter;
mod loader;
mod types;
mod validator;

pub use annotate::annotate_optional;
pub use dialect::{check_dialect, is_flat};
pub use error::{FlattenError, SchemaError, ValidateError};
pub use flatten::flatten;
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{load_schema, load_schema_auto, load_schema_str};
pub use types::{OPTIONAL_MARKER, UNION_KEYWORDS, UNSUPPORTED_KEYWORDS};
pub use validator::{validate, validate_against_schema};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;
