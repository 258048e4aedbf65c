use serde::{Deserialize, Serialize};

use crate::version::SchemaVersion;

/// Options that control how schema definitions are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Skip unrecognized `$` keys instead of failing with `UNKNOWN_DIRECTIVE`.
    pub allow_unknown_directives: bool,
    /// Version assigned when the definition has no `$version`.
    pub default_version: SchemaVersion,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_unknown_directives: false,
            default_version: SchemaVersion::default(),
        }
    }
}
