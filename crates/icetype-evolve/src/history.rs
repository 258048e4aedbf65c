use chrono::{DateTime, Utc};
use icetype_core::{IssueSeverity, Schema, SchemaVersion, ValidationIssue, ValidationReport};
use jsonschema::JSONSchema;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::checksum::{compute_schema_checksum, is_valid_checksum};
use crate::errors::{HistoryError, Result};

/// One recorded version of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub version: SchemaVersion,
    pub timestamp: DateTime<Utc>,
    pub checksum: String,
    /// Migration script or identifier that produced this version.
    #[serde(default)]
    pub migration: Option<String>,
}

impl HistoryEntry {
    /// Entry without a migration.
    pub fn new(
        version: SchemaVersion,
        checksum: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            version,
            timestamp,
            checksum: checksum.into(),
            migration: None,
        }
    }

    /// Entry for the current state of `schema`, stamped with its `updated_at`.
    pub fn for_schema(schema: &Schema) -> Result<Self> {
        Ok(Self::new(
            schema.version,
            compute_schema_checksum(schema)?,
            schema.updated_at,
        ))
    }

    /// Record the migration that produced this version.
    pub fn with_migration(mut self, migration: impl Into<String>) -> Self {
        self.migration = Some(migration.into());
        self
    }
}

/// Append-only list of versions recorded for one schema, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaHistory {
    pub schema_name: String,
    pub entries: Vec<HistoryEntry>,
}

impl SchemaHistory {
    /// History with no entries.
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            entries: Vec::new(),
        }
    }

    /// Copy of this history with `entry` appended.
    ///
    /// The entry's version must be greater than the latest one and its
    /// checksum must be well formed.
    pub fn with_entry(&self, entry: HistoryEntry) -> std::result::Result<Self, HistoryError> {
        check_entry(self.latest(), &entry)?;
        let mut next = self.clone();
        next.entries.push(entry);
        debug!(
            schema = %next.schema_name,
            entries = next.entries.len(),
            "history entry added"
        );
        Ok(next)
    }

    /// Entry recorded for exactly `version`.
    pub fn entry(&self, version: &SchemaVersion) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.version == *version)
    }

    /// Most recently appended entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_entry(
    latest: Option<&HistoryEntry>,
    entry: &HistoryEntry,
) -> std::result::Result<(), HistoryError> {
    if !is_valid_checksum(&entry.checksum) {
        return Err(HistoryError::InvalidChecksum {
            checksum: entry.checksum.clone(),
        });
    }
    if let Some(latest) = latest {
        if entry.version <= latest.version {
            return Err(HistoryError::NonIncreasingVersion {
                version: entry.version,
                latest: latest.version,
            });
        }
    }
    Ok(())
}

/// Empty history for `schema_name`.
pub fn create_schema_history(schema_name: impl Into<String>) -> SchemaHistory {
    SchemaHistory::new(schema_name)
}

/// See [`SchemaHistory::with_entry`]. The input history is left untouched.
pub fn add_history_entry(
    history: &SchemaHistory,
    entry: HistoryEntry,
) -> std::result::Result<SchemaHistory, HistoryError> {
    history.with_entry(entry)
}

/// Entry recorded for `version`, if any.
pub fn history_entry<'a>(
    history: &'a SchemaHistory,
    version: &SchemaVersion,
) -> Option<&'a HistoryEntry> {
    history.entry(version)
}

pub fn latest_entry(history: &SchemaHistory) -> Option<&HistoryEntry> {
    history.latest()
}

/// Pretty JSON in the `{schemaName, entries}` layout.
pub fn serialize_history(history: &SchemaHistory) -> std::result::Result<String, HistoryError> {
    Ok(serde_json::to_string_pretty(history)?)
}

/// Decode a serialized history, re-checking the append rules entry by entry.
pub fn parse_history(input: &str) -> std::result::Result<SchemaHistory, HistoryError> {
    let decoded: SchemaHistory = serde_json::from_str(input)?;
    let mut latest: Option<&HistoryEntry> = None;
    for entry in &decoded.entries {
        check_entry(latest, entry)?;
        latest = Some(entry);
    }
    Ok(decoded)
}

/// Emit the JSON Schema for serialized histories.
pub fn history_json_schema() -> RootSchema {
    schema_for!(SchemaHistory)
}

/// Validate a history JSON document against [`history_json_schema`].
pub fn validate_history_json(
    history_json: &Value,
) -> std::result::Result<ValidationReport, HistoryError> {
    let schema = serde_json::to_value(history_json_schema())?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| HistoryError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();
    if let Err(errors) = compiled.validate(history_json) {
        for error in errors {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                error.instance_path.to_string(),
                error.to_string(),
                None,
            ));
        }
    }
    if !report.valid {
        warn!(errors = report.errors.len(), "history json failed validation");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn checksum(fill: char) -> String {
        format!("sha256:{}", fill.to_string().repeat(64))
    }

    #[test]
    fn appending_returns_a_new_history() {
        let empty = create_schema_history("User");
        let one = add_history_entry(
            &empty,
            HistoryEntry::new(SchemaVersion::new(1, 0, 0), checksum('a'), at(1)),
        )
        .unwrap();

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(latest_entry(&one).unwrap().checksum, checksum('a'));
    }

    #[test]
    fn rejects_non_increasing_versions() {
        let history = create_schema_history("User")
            .with_entry(HistoryEntry::new(SchemaVersion::new(1, 1, 0), checksum('a'), at(1)))
            .unwrap();

        for version in [SchemaVersion::new(1, 1, 0), SchemaVersion::new(1, 0, 9)] {
            let err = history
                .with_entry(HistoryEntry::new(version, checksum('b'), at(2)))
                .unwrap_err();
            assert_eq!(err.code(), "HISTORY_VERSION_NOT_INCREASING");
        }
    }

    #[test]
    fn rejects_malformed_checksums() {
        let err = create_schema_history("User")
            .with_entry(HistoryEntry::new(SchemaVersion::new(1, 0, 0), "abc", at(1)))
            .unwrap_err();
        assert_eq!(err.code(), "HISTORY_INVALID_CHECKSUM");
    }

    #[test]
    fn looks_up_entries_by_version() {
        let history = create_schema_history("User")
            .with_entry(HistoryEntry::new(SchemaVersion::new(1, 0, 0), checksum('a'), at(1)))
            .unwrap()
            .with_entry(
                HistoryEntry::new(SchemaVersion::new(1, 1, 0), checksum('b'), at(2))
                    .with_migration("add_email"),
            )
            .unwrap();

        let entry = history_entry(&history, &SchemaVersion::new(1, 1, 0)).unwrap();
        assert_eq!(entry.migration.as_deref(), Some("add_email"));
        assert!(history_entry(&history, &SchemaVersion::new(2, 0, 0)).is_none());
    }

    #[test]
    fn parse_rechecks_entry_order() {
        let input = r#"{
  "schemaName": "User",
  "entries": [
    { "version": "1.1.0", "timestamp": "2024-01-01T00:00:00Z", "checksum": "sha256:0000000000000000000000000000000000000000000000000000000000000000", "migration": null },
    { "version": "1.0.0", "timestamp": "2024-01-02T00:00:00Z", "checksum": "sha256:0000000000000000000000000000000000000000000000000000000000000000", "migration": null }
  ]
}"#;
        let err = parse_history(input).unwrap_err();
        assert_eq!(err.code(), "HISTORY_VERSION_NOT_INCREASING");

        let err = parse_history("{\"schemaName\": \"User\"}").unwrap_err();
        assert_eq!(err.code(), "HISTORY_INVALID_JSON");
    }
}
