use std::collections::BTreeMap;

use icetype_core::{
    DefaultValue, FieldDefinition, Modifier, RelationDefinition, Schema, SchemaDirectives,
};
use serde::Serialize;

/// Order-independent view of a schema used for checksums and diffing.
///
/// Fields are sorted by name, directive lists are sorted, and the version and
/// timestamps are left out. Composite index columns keep their declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSchema {
    pub name: String,
    pub fields: Vec<CanonicalField>,
    pub relations: BTreeMap<String, RelationDefinition>,
    pub directives: SchemaDirectives,
}

/// A field name paired with its shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalField {
    pub name: String,
    #[serde(flatten)]
    pub shape: FieldShape,
}

/// Everything that defines a field except its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldShape {
    #[serde(rename = "type")]
    pub field_type: String,
    pub modifier: Modifier,
    pub is_array: bool,
    pub is_optional: bool,
    pub is_unique: bool,
    pub is_indexed: bool,
    pub default_value: Option<DefaultValue>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub length: Option<u32>,
    pub relation: Option<RelationDefinition>,
}

impl FieldShape {
    /// Shape of `field`, dropping its name.
    pub fn of(field: &FieldDefinition) -> Self {
        Self {
            field_type: field.field_type.clone(),
            modifier: field.modifier,
            is_array: field.is_array,
            is_optional: field.is_optional,
            is_unique: field.is_unique,
            is_indexed: field.is_indexed,
            default_value: field.default_value.clone(),
            precision: field.precision,
            scale: field.scale,
            length: field.length,
            relation: field.relation.clone(),
        }
    }

    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }
}

impl CanonicalSchema {
    /// Canonicalize `schema`. Equal results mean equal checksums.
    pub fn from_schema(schema: &Schema) -> Self {
        let mut fields: Vec<CanonicalField> = schema
            .fields
            .iter()
            .map(|field| CanonicalField {
                name: field.name.clone(),
                shape: FieldShape::of(field),
            })
            .collect();
        fields.sort_by(|left, right| left.name.cmp(&right.name));

        let mut directives = schema.directives.clone();
        directives.partition_by.sort();
        directives.index.sort();
        directives.fts.sort();
        directives.vector.sort();

        Self {
            name: schema.name.clone(),
            fields,
            relations: schema.relations.clone(),
            directives,
        }
    }

    pub fn field(&self, name: &str) -> Option<&CanonicalField> {
        self.fields.iter().find(|field| field.name == name)
    }
}
