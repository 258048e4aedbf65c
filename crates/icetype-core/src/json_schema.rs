use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::schema::Schema;

/// Emit the JSON Schema for serialized [`Schema`] documents.
pub fn schema_json_schema() -> RootSchema {
    schema_for!(Schema)
}
