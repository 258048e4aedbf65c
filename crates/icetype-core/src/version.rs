use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema as JsonSchemaObject, SchemaObject, StringValidation};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VersionError;

/// Semantic version of a schema (`major.minor.patch`).
///
/// Ordering is lexicographic over major, minor, then patch. Serialized as the
/// dotted string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
/// Version from already-validated components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Build a version from untyped numeric components (e.g. decoded JSON numbers).
    ///
    /// Rejects negative, fractional, NaN, infinite and out-of-range values.
    pub fn from_components(major: f64, minor: f64, patch: f64) -> Result<Self, VersionError> {
        Ok(Self {
            major: component("major", major)?,
            minor: component("minor", minor)?,
            patch: component("patch", patch)?,
        })
    }

/// Next major version with minor and patch reset.
///
/// Fails with `VERSION_OVERFLOW` at `u32::MAX`.
    pub fn increment_major(self) -> Result<Self, VersionError> {
        let major = self
            .major
            .checked_add(1)
            .ok_or(VersionError::Overflow { component: "major" })?;
        Ok(Self::new(major, 0, 0))
    }

/// Next minor version, resetting patch.
    pub fn increment_minor(self) -> Result<Self, VersionError> {
        let minor = self
            .minor
            .checked_add(1)
            .ok_or(VersionError::Overflow { component: "minor" })?;
        Ok(Self::new(self.major, minor, 0))
    }

/// Next patch version.
    pub fn increment_patch(self) -> Result<Self, VersionError> {
        let patch = self
            .patch
            .checked_add(1)
            .ok_or(VersionError::Overflow { component: "patch" })?;
        Ok(Self::new(self.major, self.minor, patch))
    }

    /// Returns true when a consumer built against `self` can read `newer`.
    ///
    /// `newer` must not be older, and must share the major version. While the
    /// major version is `0`, minor bumps are breaking as well.
    pub fn is_compatible_with(&self, newer: &SchemaVersion) -> bool {
        if newer < self || newer.major != self.major {
            return false;
        }
        self.major != 0 || newer.minor == self.minor
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

fn component(name: &'static str, value: f64) -> Result<u32, VersionError> {
    let valid = value.is_finite() && value >= 0.0 && value.fract() == 0.0;
    if !valid || value > f64::from(u32::MAX) {
        return Err(VersionError::InvalidComponent {
            component: name,
            value: value.to_string(),
        });
    }
    Ok(value as u32)
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::Malformed {
            input: input.to_string(),
        };

        let mut parts = input.split('.');
        let mut next = || -> Result<u32, VersionError> {
            let part = parts.next().ok_or_else(malformed)?;
            let digits_only = !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
            let leading_zero = part.len() > 1 && part.starts_with('0');
            if !digits_only || leading_zero {
                return Err(malformed());
            }
            part.parse::<u32>().map_err(|_| malformed())
        };

        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(version)
    }
}

/// Free-function form of [`SchemaVersion::new`].
pub fn create_schema_version(major: u32, minor: u32, patch: u32) -> SchemaVersion {
    SchemaVersion::new(major, minor, patch)
}

/// Parse a strict `major.minor.patch` string. Leading zeros, signs and
/// whitespace are rejected.
pub fn parse_schema_version(input: &str) -> Result<SchemaVersion, VersionError> {
    input.parse()
}

/// Dotted string form, the inverse of [`parse_schema_version`].
pub fn serialize_schema_version(version: &SchemaVersion) -> String {
    version.to_string()
}

/// Orders by major, then minor, then patch.
pub fn compare_versions(left: &SchemaVersion, right: &SchemaVersion) -> Ordering {
    left.cmp(right)
}

/// See [`SchemaVersion::is_compatible_with`].
pub fn is_compatible(older: &SchemaVersion, newer: &SchemaVersion) -> bool {
    older.is_compatible_with(newer)
}

pub fn increment_major(version: &SchemaVersion) -> Result<SchemaVersion, VersionError> {
    version.increment_major()
}

pub fn increment_minor(version: &SchemaVersion) -> Result<SchemaVersion, VersionError> {
    version.increment_minor()
}

pub fn increment_patch(version: &SchemaVersion) -> Result<SchemaVersion, VersionError> {
    version.increment_patch()
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for SchemaVersion {
    fn schema_name() -> String {
        "SchemaVersion".to_string()
    }

    fn json_schema(_: &mut SchemaGenerator) -> JsonSchemaObject {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                pattern: Some(r"^(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)$".to_string()),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_well_formed_strings() {
        for input in ["0.0.0", "1.2.3", "10.20.30", "4294967295.0.1"] {
            let version = parse_schema_version(input).expect("parse version");
            assert_eq!(serialize_schema_version(&version), input);
            assert_eq!(parse_schema_version(&version.to_string()), Ok(version));
        }
    }

    #[test]
    fn rejects_malformed_strings() {
        for input in [
            "", "1", "1.2", "1.2.3.4", "v1.2.3", "1.2.3-beta", "01.2.3", "1..3", "-1.2.3",
            "+1.2.3", " 1.2.3", "1.2.x", "4294967296.0.0",
        ] {
            let err = parse_schema_version(input).expect_err(input);
            assert_eq!(err.code(), "INVALID_VERSION_FORMAT", "{input}");
        }
    }

    #[test]
    fn rejects_invalid_components() {
        assert!(SchemaVersion::from_components(-1.0, 0.0, 0.0).is_err());
        assert!(SchemaVersion::from_components(1.5, 0.0, 0.0).is_err());
        assert!(SchemaVersion::from_components(1.0, f64::NAN, 0.0).is_err());
        assert!(SchemaVersion::from_components(1.0, 0.0, f64::INFINITY).is_err());
        assert_eq!(
            SchemaVersion::from_components(2.0, 1.0, 0.0),
            Ok(SchemaVersion::new(2, 1, 0))
        );
    }

    #[test]
    fn compatibility_rules() {
        let v = |s: &str| parse_schema_version(s).unwrap();
        assert!(is_compatible(&v("1.0.0"), &v("1.0.0")));
        assert!(!is_compatible(&v("1.0.0"), &v("2.0.0")));
        assert!(!is_compatible(&v("0.1.0"), &v("0.2.0")));
        assert!(is_compatible(&v("0.1.0"), &v("0.1.1")));
        assert!(is_compatible(&v("1.2.0"), &v("1.3.5")));
        assert!(!is_compatible(&v("1.3.0"), &v("1.2.9")));
    }

    #[test]
    fn increments_reset_lower_components() {
        let version = SchemaVersion::new(1, 2, 3);
        assert_eq!(increment_major(&version), Ok(SchemaVersion::new(2, 0, 0)));
        assert_eq!(increment_minor(&version), Ok(SchemaVersion::new(1, 3, 0)));
        assert_eq!(increment_patch(&version), Ok(SchemaVersion::new(1, 2, 4)));
        assert!(SchemaVersion::new(1, 2, u32::MAX).increment_patch().is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut versions = vec![
            SchemaVersion::new(1, 10, 0),
            SchemaVersion::new(0, 9, 9),
            SchemaVersion::new(1, 2, 30),
            SchemaVersion::new(1, 2, 4),
        ];
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["0.9.9", "1.2.4", "1.2.30", "1.10.0"]);
        assert_eq!(
            compare_versions(&SchemaVersion::new(2, 0, 0), &SchemaVersion::new(1, 99, 99)),
            Ordering::Greater
        );
    }
}
