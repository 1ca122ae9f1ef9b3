//! Schema linting - flattening preflight for schema files.
//!
//! Reports, before any schema is flattened:
//! - JSON syntax errors
//! - `$ref` values that would be fatal (non-string) or silently dropped
//!   (unknown `$defs` target, external file/URL reference)
//! - unions that will lossily collapse to their first branch
//! - arrays whose `items` will default to string

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::loader::load_schema;
use crate::types::{json_type_name, local_ref_name, UNION_KEYWORDS};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/id/$ref")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();

    // Try to load the file (checks syntax)
    let schema = match load_schema(file) {
        Ok(s) => s,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E001".to_string(),
                file: file.to_path_buf(),
                path: "/".to_string(),
                message: format!("syntax error: {}", e),
            });
            return FileResult {
                file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    walk(&schema, file, "", &HashSet::new(), &mut diagnostics);

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

/// Recursively check a schema node, tracking definition names in scope.
fn walk(
    value: &Value,
    file: &Path,
    path: &str,
    defs_in_scope: &HashSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        Value::Object(map) => {
            // Nested $defs extend the scope for this subtree only
            let merged;
            let scope = match map.get("$defs") {
                Some(Value::Object(local)) => {
                    let mut s = defs_in_scope.clone();
                    s.extend(local.keys().cloned());
                    merged = s;
                    &merged
                }
                _ => defs_in_scope,
            };

            if let Some(ref_val) = map.get("$ref") {
                check_ref(ref_val, file, path, scope, diagnostics);
            }

            for &union_key in UNION_KEYWORDS {
                if let Some(Value::Array(branches)) = map.get(union_key) {
                    check_union(union_key, branches, file, path, diagnostics);
                }
            }

            if map.get("type").and_then(|t| t.as_str()) == Some("array")
                && !map.contains_key("items")
                && !map.contains_key("prefixItems")
            {
                diagnostics.push(Diagnostic {
                    severity: Severity::Warning,
                    code: "W003".to_string(),
                    file: file.to_path_buf(),
                    path: path.to_string(),
                    message: "array has no items or prefixItems: items will default to string"
                        .to_string(),
                });
            }

            for (key, child) in map {
                match key.as_str() {
                    // Property and definition names are data, not schema nodes
                    "properties" | "$defs" => {
                        if let Value::Object(entries) = child {
                            for (name, entry) in entries {
                                let entry_path = format!("{}/{}/{}", path, key, name);
                                walk(entry, file, &entry_path, scope, diagnostics);
                            }
                            continue;
                        }
                        walk(child, file, &format!("{}/{}", path, key), scope, diagnostics);
                    }
                    _ => {
                        walk(child, file, &format!("{}/{}", path, key), scope, diagnostics);
                    }
                }
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                walk(
                    item,
                    file,
                    &format!("{}/{}", path, i),
                    defs_in_scope,
                    diagnostics,
                );
            }
        }
        _ => {}
    }
}

/// Check a single `$ref` value.
fn check_ref(
    ref_val: &Value,
    file: &Path,
    path: &str,
    scope: &HashSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let ref_path = format!("{}/$ref", path);

    let Some(ref_str) = ref_val.as_str() else {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code: "E002".to_string(),
            file: file.to_path_buf(),
            path: ref_path,
            message: format!(
                "$ref must be a string, got {}: flattening will fail",
                json_type_name(ref_val)
            ),
        });
        return;
    };

    match local_ref_name(ref_str) {
        Some(name) => {
            if !scope.contains(name) {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    code: "E003".to_string(),
                    file: file.to_path_buf(),
                    path: ref_path,
                    message: format!(
                        "unknown definition \"{}\": reference will be dropped during flattening",
                        name
                    ),
                });
            }
        }
        None => {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                code: "W001".to_string(),
                file: file.to_path_buf(),
                path: ref_path,
                message: format!(
                    "non-$defs reference \"{}\": reference will be dropped during flattening",
                    ref_str
                ),
            });
        }
    }
}

/// Warn when a union will lossily collapse to its first branch.
fn check_union(
    union_key: &str,
    branches: &[Value],
    file: &Path,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if union_key == "allOf" {
        // allOf merges rather than collapses; nothing lossy to report
        return;
    }

    let non_null = branches
        .iter()
        .filter(|b| b.is_object() && b.get("type").and_then(|t| t.as_str()) != Some("null"))
        .count();

    if non_null > 1 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code: "W002".to_string(),
            file: file.to_path_buf(),
            path: format!("{}/{}", path, union_key),
            message: format!(
                "{} with {} non-null branches collapses to its first branch",
                union_key, non_null
            ),
        });
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn lint_clean_schema() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"{{
            "$defs": {{ "Name": {{ "type": "string" }} }},
            "type": "object",
            "properties": {{
                "name": {{ "$ref": "#/$defs/Name" }}
            }}
        }}"##
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not valid json }}").unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_non_string_ref() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "data": {{ "$ref": 42 }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E002"));
    }

    #[test]
    fn lint_unknown_definition() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"{{
            "type": "object",
            "properties": {{
                "data": {{ "$ref": "#/$defs/Missing" }}
            }}
        }}"##
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.code == "E003")
            .unwrap();
        assert_eq!(diag.path, "/properties/data/$ref");
    }

    #[test]
    fn lint_definition_in_scope_via_nested_defs() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"{{
            "type": "object",
            "properties": {{
                "data": {{
                    "$defs": {{ "Local": {{ "type": "string" }} }},
                    "$ref": "#/$defs/Local"
                }}
            }}
        }}"##
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_external_ref_warns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "data": {{ "$ref": "other.json#/$defs/Thing" }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W001"));
    }

    #[test]
    fn lint_lossy_union_warns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "id": {{ "anyOf": [{{ "type": "string" }}, {{ "type": "integer" }}] }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Warning);
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.code == "W002")
            .unwrap();
        assert_eq!(diag.path, "/properties/id/anyOf");
    }

    #[test]
    fn lint_nullable_union_not_lossy() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "note": {{ "anyOf": [{{ "type": "string" }}, {{ "type": "null" }}] }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_bare_array_warns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "tags": {{ "type": "array" }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W003"));
    }

    #[test]
    fn lint_tuple_array_does_not_warn() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "array",
            "prefixItems": [{{ "type": "integer" }}]
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        let valid_path = dir.path().join("valid.json");
        std::fs::write(&valid_path, r#"{"type": "object"}"#).unwrap();

        let invalid_path = dir.path().join("invalid.json");
        std::fs::write(&invalid_path, "{ not json }").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.json");
        // Schema with a warning only (bare array)
        std::fs::write(&file_path, r#"{"type": "array"}"#).unwrap();

        // Non-strict: warnings don't cause failure
        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        // Strict: warnings cause failure
        let result = lint(&file_path, true);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
