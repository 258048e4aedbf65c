use std::collections::BTreeSet;

use icetype_core::{FieldDefinition, Modifier, Schema, SchemaLookup};
use tracing::{debug, info};

use crate::errors::{ExpandError, ExpandErrorCode, Result};

/// Name given to the expanded copy of `name`.
pub fn expanded_name(name: &str) -> String {
    format!("{name}_expanded")
}

/// Denormalize the relations named by `paths` into prefixed fields.
///
/// Paths are dot-separated relation hops (`customer`, `customer.address`). The
/// result keeps every original field that is neither an expanded relation nor
/// shadowed by an expanded field, followed by the expanded fields. The relation
/// map drops expanded relations and any relation whose field was shadowed.
/// Either the whole expansion succeeds or an error is returned.
pub fn expand_relations<P, L>(schema: &Schema, paths: &[P], all_schemas: &L) -> Result<Schema>
where
    P: AsRef<str>,
    L: SchemaLookup + ?Sized,
{
    let paths = normalize_paths(schema, paths)?;
    info!(schema = %schema.name, paths = paths.len(), "expanding relations");

    for path in &paths {
        check_cycles(schema, path, all_schemas)?;
    }

    let mut expanded: Vec<FieldDefinition> = Vec::new();
    let mut expanded_names: BTreeSet<String> = BTreeSet::new();
    let mut dropped_relations: BTreeSet<&str> = BTreeSet::new();

    for path in &paths {
        let segments: Vec<&str> = path.split('.').collect();
        let resolver = Resolver {
            path,
            lookup: all_schemas,
        };
        let mut fields = Vec::new();
        resolver.resolve(schema, &segments, "", false, &mut fields)?;
        debug!(path = %path, fields = fields.len(), "path expanded");

        for field in fields {
            if expanded_names.insert(field.name.clone()) {
                expanded.push(field);
            } else {
                debug!(field = %field.name, "skipping duplicate expanded field");
            }
        }
        if let Some(first) = segments.first() {
            dropped_relations.insert(*first);
        }
    }

    let mut fields: Vec<FieldDefinition> = schema
        .fields
        .iter()
        .filter(|field| {
            !dropped_relations.contains(field.name.as_str())
                && !expanded_names.contains(&field.name)
        })
        .cloned()
        .collect();
    fields.extend(expanded);

    let relations = schema
        .relations
        .iter()
        .filter(|(name, _)| {
            !dropped_relations.contains(name.as_str()) && !expanded_names.contains(*name)
        })
        .map(|(name, relation)| (name.clone(), relation.clone()))
        .collect();

    info!(
        schema = %schema.name,
        fields = fields.len(),
        dropped_relations = dropped_relations.len(),
        "relations expanded"
    );

    Ok(Schema {
        name: expanded_name(&schema.name),
        version: schema.version,
        fields,
        relations,
        directives: schema.directives.clone(),
        created_at: schema.created_at,
        updated_at: schema.updated_at,
    })
}

/// Trim, de-duplicate and order paths by ascending depth.
fn normalize_paths<P: AsRef<str>>(schema: &Schema, paths: &[P]) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut normalized = Vec::new();

    for raw in paths {
        let path = raw.as_ref().trim();
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(ExpandError::new(
                ExpandErrorCode::UnknownPath,
                path,
                &schema.name,
                "expansion path must be a non-empty dot-separated list of relations",
            ));
        }
        if seen.insert(path.to_string()) {
            normalized.push(path.to_string());
        }
    }

    normalized.sort_by_key(|path| path.split('.').count());
    Ok(normalized)
}

/// Walk `path` as relation hops and fail when a hop revisits a type already on
/// this path. The seed schema counts as visited. Segments that do not resolve
/// end the walk; resolution reports them.
fn check_cycles<L>(schema: &Schema, path: &str, lookup: &L) -> Result<()>
where
    L: SchemaLookup + ?Sized,
{
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    visited.insert(schema.name.as_str());
    let mut current = schema;

    for segment in path.split('.') {
        let Some(relation) = current.relation(segment) else {
            return Ok(());
        };
        let target = relation.target_type.as_str();
        if !visited.insert(target) {
            return Err(ExpandError::new(
                ExpandErrorCode::CircularReference,
                path,
                &current.name,
                format!("relation '{segment}' revisits type '{target}'"),
            ));
        }
        match lookup.lookup(target) {
            Some(next) => current = next,
            None => return Ok(()),
        }
    }

    Ok(())
}

struct Resolver<'a, L: ?Sized> {
    path: &'a str,
    lookup: &'a L,
}

impl<L> Resolver<'_, L>
where
    L: SchemaLookup + ?Sized,
{
    fn error(&self, code: ExpandErrorCode, schema: &Schema, message: String) -> ExpandError {
        ExpandError::new(code, self.path, &schema.name, message)
    }

    fn resolve(
        &self,
        current: &Schema,
        segments: &[&str],
        prefix: &str,
        optional: bool,
        out: &mut Vec<FieldDefinition>,
    ) -> Result<()> {
        let Some((segment, rest)) = segments.split_first() else {
            return Ok(());
        };

        let Some(relation) = current.relation(segment) else {
            let code = if current.has_field(segment) {
                ExpandErrorCode::NotARelation
            } else {
                ExpandErrorCode::UnknownPath
            };
            let message = match code {
                ExpandErrorCode::NotARelation => {
                    format!("'{segment}' is a plain field and cannot be expanded")
                }
                _ => format!("'{segment}' is not a field of '{}'", current.name),
            };
            return Err(self.error(code, current, message));
        };

        let target = self.lookup.lookup(&relation.target_type).ok_or_else(|| {
            self.error(
                ExpandErrorCode::MissingSchema,
                current,
                format!(
                    "relation '{segment}' targets unknown schema '{}'",
                    relation.target_type
                ),
            )
        })?;

        let prefix = if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}_{segment}")
        };
        let optional = optional || relation.is_optional;

        if !rest.is_empty() {
            return self.resolve(target, rest, &prefix, optional, out);
        }

        for field in target.fields.iter().filter(|field| !field.is_relation()) {
            let is_optional = optional || field.is_optional;
            out.push(FieldDefinition {
                name: format!("{prefix}_{}", field.name),
                modifier: if is_optional {
                    Modifier::Optional
                } else {
                    Modifier::None
                },
                is_optional,
                is_unique: false,
                is_indexed: false,
                relation: None,
                ..field.clone()
            });
        }

        if relation.is_array {
            let mut collection = FieldDefinition::new(
                prefix,
                "json",
                if optional {
                    Modifier::Optional
                } else {
                    Modifier::None
                },
            );
            collection.is_array = true;
            out.push(collection);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use icetype_core::parse_schema;
    use serde_json::json;

    use super::*;

    fn schemas(defs: &[serde_json::Value]) -> HashMap<String, Schema> {
        defs.iter()
            .map(|def| {
                let schema = parse_schema(def).expect("parse schema");
                (schema.name.clone(), schema)
            })
            .collect()
    }

    #[test]
    fn normalizes_paths_by_depth_without_duplicates() {
        let schema = parse_schema(&json!({ "$type": "A" })).unwrap();
        let paths = normalize_paths(&schema, &["b.c", " a ", "b", "a", "b.c"]).unwrap();
        assert_eq!(paths, ["a", "b", "b.c"]);
    }

    #[test]
    fn rejects_empty_segments() {
        let schema = parse_schema(&json!({ "$type": "A" })).unwrap();
        for bad in ["", "a..b", ".a", "a."] {
            let err = normalize_paths(&schema, &[bad]).unwrap_err();
            assert_eq!(err.code, ExpandErrorCode::UnknownPath, "{bad}");
        }
    }

    #[test]
    fn cycle_check_tracks_each_path_separately() {
        let all = schemas(&[
            json!({ "$type": "Order", "customer": "-> User", "salesRep": "-> User" }),
            json!({ "$type": "User", "team": "-> Team" }),
            json!({ "$type": "Team", "lead": "-> User" }),
        ]);
        let order = &all["Order"];
        assert!(check_cycles(order, "customer", &all).is_ok());
        assert!(check_cycles(order, "salesRep", &all).is_ok());
        assert!(check_cycles(order, "customer.team", &all).is_ok());

        let err = check_cycles(order, "customer.team.lead", &all).unwrap_err();
        assert_eq!(err.code, ExpandErrorCode::CircularReference);
        assert_eq!(err.schema, "Team");
    }

    #[test]
    fn has_many_synthesizes_collection_field() {
        let all = schemas(&[
            json!({ "$type": "Author", "name": "string!", "posts": "<- Post.author[]" }),
            json!({ "$type": "Post", "title": "string!", "body": "text?" }),
        ]);
        let expanded = expand_relations(&all["Author"], &["posts"], &all).unwrap();

        let names: Vec<&str> = expanded.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "posts_title", "posts_body", "posts"]);

        let collection = expanded.field("posts").unwrap();
        assert_eq!(collection.field_type, "json");
        assert!(collection.is_array);
        assert!(!collection.is_relation());
        assert!(expanded.relations.is_empty());
    }
}
