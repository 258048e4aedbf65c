use chrono::{TimeZone, Utc};
use icetype_core::{ParseOptions, Schema, SchemaVersion, parse_schema_at};
use icetype_evolve::{compute_schema_checksum, is_valid_checksum};
use serde_json::{Value, json};

fn schema_at(definition: Value, day: u32) -> Schema {
    let now = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
    parse_schema_at(&definition, &ParseOptions::default(), now).expect("parse schema")
}

fn checksum(schema: &Schema) -> String {
    compute_schema_checksum(schema).expect("checksum")
}

fn base() -> Value {
    json!({
        "$type": "Order",
        "$version": "1.0.0",
        "$partitionBy": ["region", "day"],
        "$index": [["customer_id"], ["day", "region"]],
        "id": "uuid!",
        "customer_id": "uuid#",
        "region": "string",
        "day": "date!",
        "total": "decimal(10,2) = 0",
        "customer": "-> Customer?",
    })
}

#[test]
fn checksum_has_sha256_prefix() {
    let sum = checksum(&schema_at(base(), 1));
    assert!(sum.starts_with("sha256:"));
    assert!(is_valid_checksum(&sum));
}

#[test]
fn ignores_order_version_and_timestamps() {
    let original = schema_at(base(), 1);
    let reordered = schema_at(
        json!({
            "customer": "-> Customer?",
            "total": "decimal(10,2) = 0",
            "day": "date!",
            "region": "string",
            "customer_id": "uuid#",
            "id": "uuid!",
            "$index": [["day", "region"], ["customer_id"]],
            "$partitionBy": ["day", "region"],
            "$version": "3.2.1",
            "$type": "Order",
        }),
        9,
    );
    assert_ne!(original.version, reordered.version);
    assert_ne!(original.created_at, reordered.created_at);
    assert_eq!(checksum(&original), checksum(&reordered));

    let mut bumped = original.clone();
    bumped.version = SchemaVersion::new(9, 9, 9);
    bumped.updated_at = Utc::now();
    assert_eq!(checksum(&original), checksum(&bumped));
}

#[test]
fn changes_with_any_structural_edit() {
    let reference = checksum(&schema_at(base(), 1));

    let edits: [(&str, Value); 5] = [
        ("region", json!("text")),
        ("region", json!("string!")),
        ("total", json!("decimal(10,2) = 1")),
        ("$partitionBy", json!(["region"])),
        ("customer", json!("-> Customer")),
    ];
    for (key, value) in edits {
        let mut definition = base();
        definition[key] = value;
        let edited = checksum(&schema_at(definition, 1));
        assert_ne!(edited, reference, "editing {key} must change the checksum");
    }

    let mut extra = base();
    extra["note"] = json!("text?");
    assert_ne!(checksum(&schema_at(extra, 1)), reference);
}
