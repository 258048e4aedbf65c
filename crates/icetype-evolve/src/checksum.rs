use icetype_core::Schema;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::canonical::CanonicalSchema;
use crate::errors::Result;

const PREFIX: &str = "sha256:";

/// Content checksum of `schema` as `sha256:<hex>`.
///
/// Computed over the JSON of [`CanonicalSchema`], so declaration order,
/// version and timestamps do not affect it.
pub fn compute_schema_checksum(schema: &Schema) -> Result<String> {
    let canonical = CanonicalSchema::from_schema(schema);
    let bytes = serde_json::to_vec(&canonical)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let checksum = format!("{PREFIX}{}", hex::encode(hasher.finalize()));
    debug!(schema = %schema.name, checksum = %checksum, "checksum computed");
    Ok(checksum)
}

/// True for `sha256:` followed by 64 lowercase hex digits.
pub fn is_valid_checksum(checksum: &str) -> bool {
    checksum.strip_prefix(PREFIX).is_some_and(|digest| {
        digest.len() == 64
            && digest
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_format() {
        assert!(is_valid_checksum(&format!("sha256:{}", "0".repeat(64))));
        assert!(!is_valid_checksum(&"a".repeat(64)));
        assert!(!is_valid_checksum(&format!("sha256:{}", "A".repeat(64))));
        assert!(!is_valid_checksum(&format!("sha256:{}", "0".repeat(63))));
        assert!(!is_valid_checksum("md5:abc"));
    }
}
