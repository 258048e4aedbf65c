use std::collections::BTreeSet;

use icetype_core::{
    DefaultValue, Modifier, RelationDefinition, Schema, SchemaDirectives, SchemaVersion,
    VersionError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::{CanonicalField, CanonicalSchema, FieldShape};

/// One structural difference between two schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaChange {
    FieldAdded {
        field: String,
        #[serde(rename = "type")]
        field_type: String,
        optional: bool,
        has_default: bool,
    },
    FieldRemoved {
        field: String,
    },
    /// A removed and an added field with identical definitions.
    FieldRenamed {
        from: String,
        to: String,
    },
    TypeChanged {
        field: String,
        from: String,
        to: String,
    },
    ModifierChanged {
        field: String,
        from: Modifier,
        to: Modifier,
    },
    DefaultChanged {
        field: String,
        from: Option<DefaultValue>,
        to: Option<DefaultValue>,
    },
    RelationAdded {
        relation: String,
        definition: RelationDefinition,
    },
    RelationRemoved {
        relation: String,
    },
    RelationChanged {
        relation: String,
        from: RelationDefinition,
        to: RelationDefinition,
    },
    DirectiveChanged {
        directive: String,
    },
}

impl SchemaChange {
    /// Whether existing data or readers may stop working after this change.
    pub fn is_breaking(&self) -> bool {
        match self {
            SchemaChange::FieldAdded {
                optional,
                has_default,
                ..
            } => !optional && !has_default,
            SchemaChange::FieldRemoved { .. }
            | SchemaChange::FieldRenamed { .. }
            | SchemaChange::TypeChanged { .. }
            | SchemaChange::RelationRemoved { .. }
            | SchemaChange::RelationChanged { .. } => true,
            SchemaChange::ModifierChanged { from, to, .. } => {
                (from.is_optional() && !to.is_optional()) || (!from.is_unique() && to.is_unique())
            }
            SchemaChange::DefaultChanged { .. }
            | SchemaChange::RelationAdded { .. }
            | SchemaChange::DirectiveChanged { .. } => false,
        }
    }

    fn is_addition(&self) -> bool {
        matches!(
            self,
            SchemaChange::FieldAdded { .. } | SchemaChange::RelationAdded { .. }
        )
    }
}

/// Ordered list of changes from one schema to another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDiff {
    pub changes: Vec<SchemaChange>,
}

impl SchemaDiff {
    /// True when the two schemas are structurally identical.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True when any change would break existing readers.
    pub fn is_breaking(&self) -> bool {
        self.changes.iter().any(SchemaChange::is_breaking)
    }

    pub fn breaking_changes(&self) -> impl Iterator<Item = &SchemaChange> {
        self.changes.iter().filter(|change| change.is_breaking())
    }
}

/// Smallest version increment that covers a diff.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum VersionBump {
    None,
    Patch,
    Minor,
    Major,
}

/// Compare two schemas through their canonical forms.
///
/// Plain fields are matched by name; an unmatched removed field whose shape
/// equals an unmatched added field is reported as a rename. Relation fields
/// are reported through the relation map only. Changes come out as field
/// changes in name order, then relation changes, then directive changes.
pub fn diff_schemas(old: &Schema, new: &Schema) -> SchemaDiff {
    let old = CanonicalSchema::from_schema(old);
    let new = CanonicalSchema::from_schema(new);
    let mut changes = Vec::new();

    let old_fields: Vec<&CanonicalField> = plain_fields(&old).collect();
    let new_fields: Vec<&CanonicalField> = plain_fields(&new).collect();

    let removed: Vec<&CanonicalField> = old_fields
        .iter()
        .copied()
        .filter(|field| !new_fields.iter().any(|other| other.name == field.name))
        .collect();
    let mut added: Vec<&CanonicalField> = new_fields
        .iter()
        .copied()
        .filter(|field| !old_fields.iter().any(|other| other.name == field.name))
        .collect();

    for field in removed {
        match added.iter().position(|other| other.shape == field.shape) {
            Some(idx) => {
                let target = added.remove(idx);
                changes.push(SchemaChange::FieldRenamed {
                    from: field.name.clone(),
                    to: target.name.clone(),
                });
            }
            None => changes.push(SchemaChange::FieldRemoved {
                field: field.name.clone(),
            }),
        }
    }

    for field in added {
        changes.push(SchemaChange::FieldAdded {
            field: field.name.clone(),
            field_type: type_expression(&field.shape),
            optional: field.shape.is_optional,
            has_default: field.shape.default_value.is_some(),
        });
    }

    for before in &old_fields {
        let Some(after) = new_fields.iter().find(|other| other.name == before.name) else {
            continue;
        };
        compare_field(&before.name, &before.shape, &after.shape, &mut changes);
    }

    compare_relations(&old, &new, &mut changes);
    compare_directives(&old.directives, &new.directives, &mut changes);

    debug!(
        schema = %new.name,
        changes = changes.len(),
        "schemas diffed"
    );
    SchemaDiff { changes }
}

/// Version increment implied by `diff`: breaking changes need a major bump,
/// additions a minor bump, anything else a patch.
pub fn suggest_version_bump(diff: &SchemaDiff) -> VersionBump {
    if diff.is_empty() {
        VersionBump::None
    } else if diff.is_breaking() {
        VersionBump::Major
    } else if diff.changes.iter().any(SchemaChange::is_addition) {
        VersionBump::Minor
    } else {
        VersionBump::Patch
    }
}

/// Apply the suggested bump to `current`.
///
/// Before 1.0.0 a breaking change bumps the minor component, which is what
/// makes the result incompatible under the pre-release compatibility rule.
pub fn next_version(
    current: &SchemaVersion,
    diff: &SchemaDiff,
) -> Result<SchemaVersion, VersionError> {
    match suggest_version_bump(diff) {
        VersionBump::None => Ok(*current),
        VersionBump::Patch => current.increment_patch(),
        VersionBump::Minor => current.increment_minor(),
        VersionBump::Major if current.major == 0 => current.increment_minor(),
        VersionBump::Major => current.increment_major(),
    }
}

fn plain_fields(schema: &CanonicalSchema) -> impl Iterator<Item = &CanonicalField> {
    schema.fields.iter().filter(|field| !field.shape.is_relation())
}

fn type_expression(shape: &FieldShape) -> String {
    let mut out = shape.field_type.clone();
    match (shape.precision, shape.scale, shape.length) {
        (Some(precision), Some(scale), _) => out.push_str(&format!("({precision}, {scale})")),
        (Some(precision), None, _) => out.push_str(&format!("({precision})")),
        (None, _, Some(length)) => out.push_str(&format!("({length})")),
        _ => {}
    }
    if shape.is_array {
        out.push_str("[]");
    }
    out
}

fn compare_field(name: &str, before: &FieldShape, after: &FieldShape, out: &mut Vec<SchemaChange>) {
    let (from, to) = (type_expression(before), type_expression(after));
    if from != to {
        out.push(SchemaChange::TypeChanged {
            field: name.to_string(),
            from,
            to,
        });
    }

    let flags = |shape: &FieldShape| (shape.is_optional, shape.is_unique, shape.is_indexed);
    if before.modifier != after.modifier || flags(before) != flags(after) {
        out.push(SchemaChange::ModifierChanged {
            field: name.to_string(),
            from: before.modifier,
            to: after.modifier,
        });
    }

    if before.default_value != after.default_value {
        out.push(SchemaChange::DefaultChanged {
            field: name.to_string(),
            from: before.default_value.clone(),
            to: after.default_value.clone(),
        });
    }
}

fn compare_relations(old: &CanonicalSchema, new: &CanonicalSchema, out: &mut Vec<SchemaChange>) {
    let names: BTreeSet<&String> = old.relations.keys().chain(new.relations.keys()).collect();
    for name in names {
        match (old.relations.get(name), new.relations.get(name)) {
            (Some(before), Some(after)) if before != after => {
                out.push(SchemaChange::RelationChanged {
                    relation: name.clone(),
                    from: before.clone(),
                    to: after.clone(),
                });
            }
            (Some(_), None) => out.push(SchemaChange::RelationRemoved {
                relation: name.clone(),
            }),
            (None, Some(after)) => out.push(SchemaChange::RelationAdded {
                relation: name.clone(),
                definition: after.clone(),
            }),
            _ => {}
        }
    }
}

fn compare_directives(old: &SchemaDirectives, new: &SchemaDirectives, out: &mut Vec<SchemaChange>) {
    let mut changed = |directive: &str, differs: bool| {
        if differs {
            out.push(SchemaChange::DirectiveChanged {
                directive: directive.to_string(),
            });
        }
    };
    changed("$partitionBy", old.partition_by != new.partition_by);
    changed("$index", old.index != new.index);
    changed("$fts", old.fts != new.fts);
    changed("$vector", old.vector != new.vector);
}
