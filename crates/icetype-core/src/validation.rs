use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::Schema;
use crate::types::{is_known_type, primitive_names};

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation outcome. `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error issue.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
        self.valid = false;
    }

    /// Add a warning issue.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.valid = self.errors.is_empty();
    }

    /// Error codes in report order.
    pub fn error_codes(&self) -> Vec<&str> {
        self.errors.iter().map(|issue| issue.code.as_str()).collect()
    }
}

/// Validate type names and directive references of a parsed schema.
///
/// Never fails; every problem found is collected into the report:
/// - fields with unknown base types (relation fields are skipped)
/// - duplicate field names
/// - `$partitionBy`, `$index`, `$fts` and `$vector` entries naming missing fields
/// - `$vector` dimensions that are not positive
/// - a missing `$type` (warning only)
pub fn validate_schema(schema: &Schema) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut names = BTreeSet::new();

    if !schema.has_name() {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "MISSING_SCHEMA_NAME",
            "$type",
            "schema has no type name",
            Some("add a $type directive".to_string()),
        ));
    }

    for field in &schema.fields {
        let path = format!("fields.{}", field.name);
        if !names.insert(field.name.as_str()) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "DUPLICATE_FIELD",
                path.clone(),
                format!("field '{}' is declared more than once", field.name),
                None,
            ));
        }

        if !field.is_relation() && !is_known_type(&field.field_type) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "UNKNOWN_TYPE",
                path,
                format!(
                    "field '{}' has unknown type '{}'",
                    field.name, field.field_type
                ),
                Some(format!("use one of: {}", primitive_names().join(", "))),
            ));
        }
    }

    let directives = &schema.directives;
    for (idx, name) in directives.partition_by.iter().enumerate() {
        check_field_ref(
            schema,
            &mut report,
            "UNKNOWN_PARTITION_FIELD",
            format!("$partitionBy[{idx}]"),
            name,
        );
    }

    for (idx, index) in directives.index.iter().enumerate() {
        for (pos, name) in index.fields.iter().enumerate() {
            check_field_ref(
                schema,
                &mut report,
                "UNKNOWN_INDEX_FIELD",
                format!("$index[{idx}][{pos}]"),
                name,
            );
        }
    }

    for (idx, name) in directives.fts.iter().enumerate() {
        check_field_ref(
            schema,
            &mut report,
            "UNKNOWN_FTS_FIELD",
            format!("$fts[{idx}]"),
            name,
        );
    }

    for vector in &directives.vector {
        let path = format!("$vector.{}", vector.field);
        check_field_ref(
            schema,
            &mut report,
            "UNKNOWN_VECTOR_FIELD",
            path.clone(),
            &vector.field,
        );
        if vector.dimensions <= 0 {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "INVALID_VECTOR_DIMENSIONS",
                path,
                format!(
                    "vector field '{}' has invalid dimensions {}",
                    vector.field, vector.dimensions
                ),
                Some("dimensions must be a positive integer".to_string()),
            ));
        }
    }

    debug!(
        schema = %schema.name,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "schema validated"
    );

    report
}

fn check_field_ref(
    schema: &Schema,
    report: &mut ValidationReport,
    code: &str,
    path: String,
    name: &str,
) {
    if !schema.has_field(name) {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            code,
            path,
            format!("directive references unknown field '{name}'"),
            None,
        ));
    }
}
