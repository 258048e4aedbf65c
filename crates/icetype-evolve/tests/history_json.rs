use chrono::{TimeZone, Utc};
use icetype_core::{ParseOptions, SchemaVersion, parse_schema_at};
use icetype_evolve::{
    HistoryEntry, add_history_entry, compute_schema_checksum, create_schema_history,
    diff_schemas, history_json_schema, next_version, parse_history, serialize_history,
    validate_history_json,
};
use serde_json::json;

fn sample_history() -> icetype_evolve::SchemaHistory {
    let day_one = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let day_two = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

    let v1 = parse_schema_at(
        &json!({ "$type": "User", "$version": "1.0.0", "id": "uuid!" }),
        &ParseOptions::default(),
        day_one,
    )
    .unwrap();
    let mut v2 = parse_schema_at(
        &json!({ "$type": "User", "id": "uuid!", "email": "string?" }),
        &ParseOptions::default(),
        day_two,
    )
    .unwrap();
    v2.version = next_version(&v1.version, &diff_schemas(&v1, &v2)).unwrap();
    assert_eq!(v2.version, SchemaVersion::new(1, 1, 0));

    let history = create_schema_history("User");
    let history = add_history_entry(&history, HistoryEntry::for_schema(&v1).unwrap()).unwrap();
    add_history_entry(
        &history,
        HistoryEntry::for_schema(&v2).unwrap().with_migration("add_user_email"),
    )
    .unwrap()
}

#[test]
fn serialized_layout_is_stable() {
    let history = sample_history();
    let serialized = serialize_history(&history).unwrap();
    let value: serde_json::Value = serde_json::from_str(&serialized).unwrap();

    assert_eq!(value["schemaName"], "User");
    let entries = value["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["version"], "1.0.0");
    assert_eq!(entries[0]["timestamp"], "2024-01-01T00:00:00Z");
    assert!(entries[0]["migration"].is_null());
    assert_eq!(entries[1]["version"], "1.1.0");
    assert_eq!(entries[1]["migration"], "add_user_email");

    let keys: Vec<&String> = entries[0].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["version", "timestamp", "checksum", "migration"]);
}

#[test]
fn parse_round_trips_serialized_history() {
    let history = sample_history();
    let parsed = parse_history(&serialize_history(&history).unwrap()).unwrap();
    assert_eq!(parsed, history);
    assert_eq!(parsed.latest().unwrap().version, SchemaVersion::new(1, 1, 0));
}

#[test]
fn checksums_differ_between_versions() {
    let history = sample_history();
    assert_ne!(history.entries[0].checksum, history.entries[1].checksum);
}

#[test]
fn serialized_history_satisfies_its_json_schema() {
    let history = sample_history();
    let value = serde_json::to_value(&history).unwrap();
    let report = validate_history_json(&value).unwrap();
    assert!(report.valid, "{:?}", report.errors);

    let generated = serde_json::to_value(history_json_schema()).unwrap();
    assert!(generated["definitions"].get("HistoryEntry").is_some());
}

#[test]
fn json_schema_rejects_bad_documents() {
    let report = validate_history_json(&json!({
        "schemaName": "User",
        "entries": [{ "version": "01.0", "timestamp": "2024-01-01T00:00:00Z", "checksum": 5 }],
    }))
    .unwrap();
    assert!(!report.valid);
    assert!(report.errors.len() >= 2);
    assert!(report.error_codes().iter().all(|code| *code == "schema_violation"));
}

#[test]
fn checksum_matches_entry() {
    let schema = parse_schema_at(
        &json!({ "$type": "User", "id": "uuid!" }),
        &ParseOptions::default(),
        Utc::now(),
    )
    .unwrap();
    let entry = HistoryEntry::for_schema(&schema).unwrap();
    assert_eq!(entry.checksum, compute_schema_checksum(&schema).unwrap());
    assert_eq!(entry.timestamp, schema.updated_at);
}
