use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::version::SchemaVersion;

/// Canonical compiled form of an IceType schema definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Type name from `$type`; empty when the definition did not set one.
    pub name: String,
    pub version: SchemaVersion,
    /// Fields in declaration order. Relation fields are included and carry
    /// their `relation`.
    pub fields: Vec<FieldDefinition>,
    pub relations: BTreeMap<String, RelationDefinition>,
    pub directives: SchemaDirectives,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns true when a field called `name` exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Relation compiled for the field `name`, if it is one.
    pub fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.get(name)
    }

    /// False for definitions that omitted `$type` or left it blank.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Single-character field modifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// `!`
    Required,
    /// `?`
    Optional,
    /// `#`
    Indexed,
    #[default]
    None,
}

impl Modifier {
    /// Modifier for a trailing `!`, `?` or `#`.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '!' => Some(Modifier::Required),
            '?' => Some(Modifier::Optional),
            '#' => Some(Modifier::Indexed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Required => "!",
            Modifier::Optional => "?",
            Modifier::Indexed => "#",
            Modifier::None => "",
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Modifier::Optional)
    }

    /// Both `!` and `#` imply uniqueness.
    pub fn is_unique(&self) -> bool {
        matches!(self, Modifier::Required | Modifier::Indexed)
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Modifier::Indexed)
    }
}

/// Literal default value of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Opaque call-like expression kept verbatim (e.g. `now()`).
    Expression(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::String(value) => write!(f, "{value:?}"),
            DefaultValue::Integer(value) => write!(f, "{value}"),
            DefaultValue::Float(value) => write!(f, "{value}"),
            DefaultValue::Boolean(value) => write!(f, "{value}"),
            DefaultValue::Expression(value) => f.write_str(value),
        }
    }
}

/// A single compiled field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    /// Base type id (lowercase primitive), or the target type for relation fields.
    #[serde(rename = "type")]
    pub field_type: String,
    pub modifier: Modifier,
    pub is_array: bool,
    pub is_optional: bool,
    pub is_unique: bool,
    pub is_indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationDefinition>,
}

impl FieldDefinition {
    /// Plain field of `field_type` with flags derived from `modifier`.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, modifier: Modifier) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            modifier,
            is_array: false,
            is_optional: modifier.is_optional(),
            is_unique: modifier.is_unique(),
            is_indexed: modifier.is_indexed(),
            default_value: None,
            precision: None,
            scale: None,
            length: None,
            relation: None,
        }
    }

    /// Returns true when the field was declared with a relation operator.
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Type rendered in the grammar accepted by the type-unification table,
    /// e.g. `decimal(10, 2)` or `string[]`.
    pub fn type_expression(&self) -> String {
        let mut out = self.field_type.clone();
        match (self.precision, self.scale, self.length) {
            (Some(precision), Some(scale), _) => out.push_str(&format!("({precision}, {scale})")),
            (Some(precision), None, _) => out.push_str(&format!("({precision})")),
            (None, _, Some(length)) => out.push_str(&format!("({length})")),
            _ => {}
        }
        if self.is_array {
            out.push_str("[]");
        }
        out
    }
}

/// Relation operator between two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RelationOperator {
    /// `->`
    #[serde(rename = "->")]
    Forward,
    /// `<-`
    #[serde(rename = "<-")]
    Backward,
    /// `~>`
    #[serde(rename = "~>")]
    FuzzyForward,
    /// `<~`
    #[serde(rename = "<~")]
    FuzzyBackward,
}

impl RelationOperator {
    /// Operator for one of `->`, `<-`, `~>` or `<~`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "->" => Some(RelationOperator::Forward),
            "<-" => Some(RelationOperator::Backward),
            "~>" => Some(RelationOperator::FuzzyForward),
            "<~" => Some(RelationOperator::FuzzyBackward),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationOperator::Forward => "->",
            RelationOperator::Backward => "<-",
            RelationOperator::FuzzyForward => "~>",
            RelationOperator::FuzzyBackward => "<~",
        }
    }

    /// `~>` and `<~` are resolved by similarity rather than by key.
    pub fn is_fuzzy(&self) -> bool {
        matches!(
            self,
            RelationOperator::FuzzyForward | RelationOperator::FuzzyBackward
        )
    }
}

/// Behaviour on deletion of the referenced row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OnDeletePolicy {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
}

impl OnDeletePolicy {
    /// Case-insensitive; accepts `set null`, `set-null` and `set_null`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "no_action" => Some(OnDeletePolicy::NoAction),
            "restrict" => Some(OnDeletePolicy::Restrict),
            "cascade" => Some(OnDeletePolicy::Cascade),
            "set_null" | "setnull" => Some(OnDeletePolicy::SetNull),
            _ => None,
        }
    }
}

/// Compiled relation between the owning schema and `target_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationDefinition {
    pub operator: RelationOperator,
    /// Target type name without its modifier.
    pub target_type: String,
    pub modifier: Modifier,
    pub is_optional: bool,
    /// Has-many relation (`[]` suffix).
    pub is_array: bool,
    /// Inverse field on the target (`Post.author` yields `author`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
    pub on_delete: OnDeletePolicy,
}

/// Composite or single-column index from `$index`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct IndexDirective {
    pub fields: Vec<String>,
}

/// Vector column from `$vector`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct VectorDirective {
    pub field: String,
    /// Kept signed so the validator can report non-positive values.
    pub dimensions: i64,
}

/// Schema-level `$` directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDirectives {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index: Vec<IndexDirective>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector: Vec<VectorDirective>,
}

impl SchemaDirectives {
    pub fn is_empty(&self) -> bool {
        self.partition_by.is_empty()
            && self.index.is_empty()
            && self.fts.is_empty()
            && self.vector.is_empty()
    }
}
