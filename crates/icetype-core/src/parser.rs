use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, ParseError, ParseErrorCode};
use crate::grammar::{self, FieldTypeAst, RelationAst};
use crate::options::ParseOptions;
use crate::schema::{
    FieldDefinition, IndexDirective, OnDeletePolicy, RelationDefinition, Schema,
    SchemaDirectives, VectorDirective,
};
use crate::version::SchemaVersion;

/// Parse a raw definition object into a [`Schema`] using default options.
pub fn parse_schema(definition: &Value) -> Result<Schema, ParseError> {
    parse_schema_with_options(definition, &ParseOptions::default())
}

/// Parse a JSON document holding a raw definition object.
pub fn parse_schema_str(json: &str) -> Result<Schema, Error> {
    let definition: Value = serde_json::from_str(json)?;
    Ok(parse_schema(&definition)?)
}

/// Parse a raw definition object, stamping `created_at` and `updated_at`
/// with the current time.
pub fn parse_schema_with_options(
    definition: &Value,
    options: &ParseOptions,
) -> Result<Schema, ParseError> {
    parse_schema_at(definition, options, Utc::now())
}

/// Parse with an explicit creation timestamp.
pub fn parse_schema_at(
    definition: &Value,
    options: &ParseOptions,
    now: DateTime<Utc>,
) -> Result<Schema, ParseError> {
    let object = definition.as_object().ok_or_else(|| {
        ParseError::new(
            ParseErrorCode::InvalidDefinition,
            "schema definition must be an object",
        )
    })?;

    let mut name = String::new();
    let mut version = options.default_version;
    let mut directives = SchemaDirectives::default();
    let mut fields: Vec<FieldDefinition> = Vec::new();
    let mut relations = BTreeMap::new();

    for (key, value) in object {
        if let Some(directive) = key.strip_prefix('$') {
            match directive {
                "type" => name = parse_type_name(key, value)?,
                "version" => version = parse_version(key, value)?,
                "partitionBy" => directives.partition_by = string_list(key, value)?,
                "index" => directives.index = parse_index(key, value)?,
                "fts" => directives.fts = string_list(key, value)?,
                "vector" => directives.vector = parse_vector(key, value)?,
                _ if options.allow_unknown_directives => {
                    warn!(directive = %key, "ignoring unknown directive");
                }
                _ => {
                    return Err(ParseError::new(
                        ParseErrorCode::UnknownDirective,
                        format!("unknown directive '{key}'"),
                    )
                    .with_path(key.as_str()));
                }
            }
            continue;
        }

        if key.trim().is_empty() {
            return Err(ParseError::new(
                ParseErrorCode::InvalidDefinition,
                "field names must not be empty",
            )
            .with_path(key.as_str()));
        }

        let field = parse_field(key, value).map_err(|err| err.with_path(key.as_str()))?;
        if let Some(relation) = &field.relation {
            relations.insert(key.clone(), relation.clone());
        }
        fields.push(field);
    }

    debug!(
        schema = %name,
        fields = fields.len(),
        relations = relations.len(),
        "schema parsed"
    );

    Ok(Schema {
        name,
        version,
        fields,
        relations,
        directives,
        created_at: now,
        updated_at: now,
    })
}

fn parse_field(name: &str, value: &Value) -> Result<FieldDefinition, ParseError> {
    match value {
        Value::String(raw) if grammar::is_relation_string(raw) => {
            let ast = grammar::parse_relation(raw)?;
            Ok(relation_field(name, ast, OnDeletePolicy::default()))
        }
        Value::String(raw) => {
            let ast = grammar::parse_field_type(raw)?;
            build_field(name, ast)
        }
        Value::Object(object) => parse_relation_object(name, object),
        _ => Err(ParseError::new(
            ParseErrorCode::InvalidDefinition,
            format!("field '{name}' must be a type string or a relation object"),
        )),
    }
}

fn parse_relation_object(
    name: &str,
    object: &Map<String, Value>,
) -> Result<FieldDefinition, ParseError> {
    let mut relation = None;
    let mut on_delete = OnDeletePolicy::default();

    for (key, value) in object {
        match (key.as_str(), value) {
            ("type", Value::String(raw)) => relation = Some(grammar::parse_relation(raw)?),
            ("onDelete", Value::String(raw)) => {
                on_delete = OnDeletePolicy::parse(raw).ok_or_else(|| {
                    ParseError::new(
                        ParseErrorCode::InvalidDefinition,
                        format!("unknown onDelete policy '{raw}'"),
                    )
                })?;
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorCode::InvalidDefinition,
                    format!("unexpected key '{key}' in relation definition of '{name}'"),
                ));
            }
        }
    }

    let ast = relation.ok_or_else(|| {
        ParseError::new(
            ParseErrorCode::InvalidDefinition,
            format!("relation definition of '{name}' requires a 'type'"),
        )
    })?;
    Ok(relation_field(name, ast, on_delete))
}

fn relation_field(name: &str, ast: RelationAst, on_delete: OnDeletePolicy) -> FieldDefinition {
    let relation = RelationDefinition {
        operator: ast.operator,
        target_type: ast.target.clone(),
        modifier: ast.modifier,
        is_optional: ast.modifier.is_optional(),
        is_array: ast.is_array,
        inverse: ast.inverse,
        on_delete,
    };

    let mut field = FieldDefinition::new(name, ast.target, ast.modifier);
    field.is_array = ast.is_array;
    field.relation = Some(relation);
    field
}

fn build_field(name: &str, ast: FieldTypeAst) -> Result<FieldDefinition, ParseError> {
    let base = ast.base.to_ascii_lowercase();
    let mut field = FieldDefinition::new(name, base.clone(), ast.modifier);
    field.is_array = ast.is_array;
    field.default_value = ast.default;

    let invalid = |reason: String| ParseError::new(ParseErrorCode::InvalidParams, reason);
    match (base.as_str(), ast.params.as_slice()) {
        (_, []) => {}
        ("decimal", [precision]) => field.precision = Some(*precision),
        ("decimal", [precision, scale]) => {
            if scale > precision {
                return Err(invalid(format!(
                    "decimal scale {scale} exceeds precision {precision}"
                )));
            }
            field.precision = Some(*precision);
            field.scale = Some(*scale);
        }
        ("varchar" | "char", [length]) => field.length = Some(*length),
        ("decimal" | "varchar" | "char", params) => {
            return Err(invalid(format!(
                "'{base}' does not accept {} parameters",
                params.len()
            )));
        }
        (_, _) => {
            return Err(invalid(format!("type '{base}' does not accept parameters")));
        }
    }

    Ok(field)
}

fn directive_error(key: &str, message: impl Into<String>) -> ParseError {
    ParseError::new(ParseErrorCode::InvalidDirective, message).with_path(key)
}

fn parse_type_name(key: &str, value: &Value) -> Result<String, ParseError> {
    match value.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => Err(directive_error(key, "$type must be a non-empty string")),
    }
}

fn parse_version(key: &str, value: &Value) -> Result<SchemaVersion, ParseError> {
    let raw = value.as_str().ok_or_else(|| {
        ParseError::new(
            ParseErrorCode::InvalidVersion,
            "$version must be a 'major.minor.patch' string",
        )
        .with_path(key)
    })?;
    raw.parse().map_err(|err: crate::error::VersionError| {
        ParseError::new(ParseErrorCode::InvalidVersion, err.to_string()).with_path(key)
    })
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ParseError> {
    match value {
        Value::String(single) => Ok(vec![single.clone()]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    directive_error(
                        &format!("{key}[{idx}]"),
                        format!("{key} entries must be strings"),
                    )
                })
            })
            .collect(),
        _ => Err(directive_error(
            key,
            format!("{key} must be a string or an array of strings"),
        )),
    }
}

fn parse_index(key: &str, value: &Value) -> Result<Vec<IndexDirective>, ParseError> {
    let items = match value {
        Value::String(single) => {
            return Ok(vec![IndexDirective {
                fields: vec![single.clone()],
            }]);
        }
        Value::Array(items) => items,
        _ => return Err(directive_error(key, "$index must be an array")),
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let path = format!("{key}[{idx}]");
            let fields = string_list(&path, item)?;
            if fields.is_empty() {
                return Err(directive_error(&path, "index must name at least one field"));
            }
            Ok(IndexDirective { fields })
        })
        .collect()
}

fn parse_vector(key: &str, value: &Value) -> Result<Vec<VectorDirective>, ParseError> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(field, dims)| {
                let path = format!("{key}.{field}");
                Ok(VectorDirective {
                    field: field.clone(),
                    dimensions: dimensions(&path, dims)?,
                })
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let path = format!("{key}[{idx}]");
                let field = item
                    .get("field")
                    .and_then(Value::as_str)
                    .ok_or_else(|| directive_error(&path, "vector entry requires a 'field'"))?;
                let dims = item
                    .get("dimensions")
                    .ok_or_else(|| directive_error(&path, "vector entry requires 'dimensions'"))?;
                Ok(VectorDirective {
                    field: field.to_string(),
                    dimensions: dimensions(&path, dims)?,
                })
            })
            .collect(),
        _ => Err(directive_error(
            key,
            "$vector must map field names to dimensions",
        )),
    }
}

fn dimensions(path: &str, value: &Value) -> Result<i64, ParseError> {
    value
        .as_i64()
        .ok_or_else(|| directive_error(path, "vector dimensions must be an integer"))
}
