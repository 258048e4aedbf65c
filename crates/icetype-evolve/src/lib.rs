//! Schema evolution for IceType: canonical form, checksums, structural diffs
//! and append-only version history.

pub mod canonical;
pub mod checksum;
pub mod diff;
pub mod errors;
pub mod history;

pub use canonical::{CanonicalField, CanonicalSchema, FieldShape};
pub use checksum::{compute_schema_checksum, is_valid_checksum};
pub use diff::{
    SchemaChange, SchemaDiff, VersionBump, diff_schemas, next_version, suggest_version_bump,
};
pub use errors::{EvolveError, HistoryError, Result};
pub use history::{
    HistoryEntry, SchemaHistory, add_history_entry, create_schema_history, history_entry,
    history_json_schema, latest_entry, parse_history, serialize_history, validate_history_json,
};
