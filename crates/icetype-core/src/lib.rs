//! Core contracts for the IceType schema compiler.
//!
//! This crate defines the canonical schema model, the DSL grammar and parser,
//! the validator, the cross-dialect type table and semantic schema versions.
//! Relation expansion and schema evolution live in sibling crates and only
//! consume these types.

pub mod error;
pub mod grammar;
pub mod json_schema;
pub mod options;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod types;
pub mod validation;
pub mod version;

pub use error::{Error, ParseError, ParseErrorCode, Result, TypeMappingError, VersionError};
pub use grammar::{FieldTypeAst, RelationAst, parse_field_type, parse_relation};
pub use json_schema::schema_json_schema;
pub use options::ParseOptions;
pub use parser::{parse_schema, parse_schema_at, parse_schema_str, parse_schema_with_options};
pub use registry::{SchemaLookup, SchemaRegistry};
pub use schema::{
    DefaultValue, FieldDefinition, IndexDirective, Modifier, OnDeletePolicy, RelationDefinition,
    RelationOperator, Schema, SchemaDirectives, VectorDirective,
};
pub use types::{
    Dialect, UnifiedMapping, all_dialects, dialect_mappings, is_known_type, primitive_names,
    unified_mapping, unified_type_mapping, unified_type_mapping_for,
};
pub use validation::{IssueSeverity, ValidationIssue, ValidationReport, validate_schema};
pub use version::{
    SchemaVersion, compare_versions, create_schema_version, increment_major, increment_minor,
    increment_patch, is_compatible, parse_schema_version, serialize_schema_version,
};
