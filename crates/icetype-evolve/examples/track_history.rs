use icetype_core::parse_schema;
use icetype_evolve::{
    HistoryEntry, add_history_entry, create_schema_history, diff_schemas, next_version,
    serialize_history,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let v1 = parse_schema(&json!({ "$type": "User", "id": "uuid!", "email": "string#" }))?;
    let mut v2 = parse_schema(&json!({
        "$type": "User",
        "id": "uuid!",
        "emailAddress": "string#",
        "nickname": "string?",
    }))?;

    let diff = diff_schemas(&v1, &v2);
    for change in &diff.changes {
        let marker = if change.is_breaking() { "!" } else { " " };
        println!("{marker} {}", serde_json::to_string(change)?);
    }
    v2.version = next_version(&v1.version, &diff)?;

    let history = create_schema_history("User");
    let history = add_history_entry(&history, HistoryEntry::for_schema(&v1)?)?;
    let history = add_history_entry(
        &history,
        HistoryEntry::for_schema(&v2)?.with_migration("rename_email"),
    )?;
    println!("{}", serialize_history(&history)?);
    Ok(())
}
