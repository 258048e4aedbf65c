use std::collections::HashMap;

use icetype_core::{Schema, SchemaRegistry, parse_schema};
use icetype_expand::{ExpandErrorCode, expand_relations};
use serde_json::{Value, json};

fn schema(definition: Value) -> Schema {
    parse_schema(&definition).expect("parse schema")
}

fn by_name(schemas: Vec<Schema>) -> HashMap<String, Schema> {
    schemas
        .into_iter()
        .map(|schema| (schema.name.clone(), schema))
        .collect()
}

fn customer() -> Schema {
    schema(json!({ "$type": "Customer", "id": "uuid!", "name": "string!" }))
}

#[test]
fn expands_required_relation_into_prefixed_fields() {
    let order = schema(json!({
        "$type": "Order",
        "total": "decimal(10,2)!",
        "customer": "-> Customer",
    }));
    let all = by_name(vec![customer()]);

    let expanded = expand_relations(&order, &["customer"], &all).expect("expand");

    assert_eq!(expanded.name, "Order_expanded");
    let id = expanded.field("customer_id").expect("customer_id");
    assert_eq!(id.field_type, "uuid");
    assert!(!id.is_optional);
    assert!(!id.is_unique && !id.is_indexed);
    let name = expanded.field("customer_name").expect("customer_name");
    assert_eq!(name.field_type, "string");
    assert!(!name.is_optional);

    assert!(expanded.relation("customer").is_none());
    assert!(expanded.field("customer").is_none());
    assert!(expanded.field("total").is_some());
}

#[test]
fn optional_relation_makes_expanded_fields_optional() {
    let order = schema(json!({ "$type": "Order", "customer": "-> Customer?" }));
    let all = by_name(vec![customer()]);

    let expanded = expand_relations(&order, &["customer"], &all).expect("expand");

    assert!(expanded.field("customer_id").unwrap().is_optional);
    assert!(expanded.field("customer_name").unwrap().is_optional);
}

#[test]
fn self_reference_is_a_cycle() {
    let person = schema(json!({ "$type": "Person", "name": "string", "manager": "-> Person?" }));
    let all = by_name(vec![person.clone()]);

    let err = expand_relations(&person, &["manager", "manager.manager"], &all)
        .expect_err("cycle must be rejected");
    assert_eq!(err.code, ExpandErrorCode::CircularReference);
    assert_eq!(err.code(), "EXPAND_CIRCULAR_REFERENCE");
    assert_eq!(err.schema, "Person");
}

#[test]
fn sibling_paths_may_target_the_same_type() {
    let order = schema(json!({
        "$type": "Order",
        "customer": "-> User",
        "salesRep": "-> User",
    }));
    let user = schema(json!({ "$type": "User", "email": "string!" }));
    let all = by_name(vec![user]);

    let expanded = expand_relations(&order, &["customer", "salesRep"], &all).expect("expand");
    assert!(expanded.field("customer_email").is_some());
    assert!(expanded.field("salesRep_email").is_some());
    assert!(expanded.relations.is_empty());
}

#[test]
fn nested_paths_accumulate_prefix_and_optionality() {
    let order = schema(json!({ "$type": "Order", "customer": "-> Customer?" }));
    let customer = schema(json!({
        "$type": "Customer",
        "name": "string!",
        "address": "-> Address",
    }));
    let address = schema(json!({ "$type": "Address", "city": "string!", "zip": "string?" }));
    let registry: SchemaRegistry = vec![customer, address].into_iter().collect();

    let expanded = expand_relations(&order, &["customer.address", "customer"], &registry)
        .expect("expand");

    let names: Vec<&str> = expanded.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        ["customer_name", "customer_address_city", "customer_address_zip"]
    );
    assert!(expanded.field("customer_address_city").unwrap().is_optional);
    assert!(expanded.field("customer_address").is_none());
}

#[test]
fn reports_unknown_segments() {
    let order = schema(json!({ "$type": "Order", "customer": "-> Customer" }));
    let all = by_name(vec![customer()]);

    let err = expand_relations(&order, &["vendor"], &all).unwrap_err();
    assert_eq!(err.code, ExpandErrorCode::UnknownPath);
    assert_eq!(err.path, "vendor");

    let err = expand_relations(&order, &["customer.region"], &all).unwrap_err();
    assert_eq!(err.code, ExpandErrorCode::UnknownPath);
    assert_eq!(err.schema, "Customer");
}

#[test]
fn plain_fields_cannot_be_traversed() {
    let order = schema(json!({ "$type": "Order", "customer": "-> Customer" }));
    let all = by_name(vec![customer()]);

    let err = expand_relations(&order, &["customer.name.first"], &all).unwrap_err();
    assert_eq!(err.code, ExpandErrorCode::NotARelation);
    assert_eq!(err.path, "customer.name.first");
}

#[test]
fn missing_target_schema_fails() {
    let order = schema(json!({ "$type": "Order", "customer": "-> Customer" }));
    let all: HashMap<String, Schema> = HashMap::new();

    let err = expand_relations(&order, &["customer"], &all).unwrap_err();
    assert_eq!(err.code, ExpandErrorCode::MissingSchema);
    assert!(err.to_string().contains("EXPAND_MISSING_SCHEMA"));
}

#[test]
fn failure_in_any_path_produces_nothing() {
    let order = schema(json!({ "$type": "Order", "customer": "-> Customer", "total": "int" }));
    let all = by_name(vec![customer()]);
    let before = order.clone();

    let result = expand_relations(&order, &["customer", "total.value"], &all);
    assert!(result.is_err());
    assert_eq!(order, before);
}

#[test]
fn expanded_fields_shadow_original_ones() {
    let order = schema(json!({
        "$type": "Order",
        "customer_name": "text?",
        "customer": "-> Customer",
    }));
    let all = by_name(vec![customer()]);

    let expanded = expand_relations(&order, &["customer"], &all).expect("expand");
    let matching: Vec<_> = expanded
        .fields
        .iter()
        .filter(|field| field.name == "customer_name")
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].field_type, "string");
}

#[test]
fn shadowed_relation_fields_leave_the_relation_map() {
    let order = schema(json!({
        "$type": "Order",
        "customer": "-> Customer",
        "customer_region": "-> Region",
    }));
    let customer = schema(json!({ "$type": "Customer", "region": "string" }));
    let region = schema(json!({ "$type": "Region", "code": "string!" }));
    let all = by_name(vec![customer, region]);

    let expanded = expand_relations(&order, &["customer"], &all).expect("expand");

    let field = expanded.field("customer_region").expect("customer_region");
    assert_eq!(field.field_type, "string");
    assert!(!field.is_relation());
    assert!(expanded.relation("customer_region").is_none());
    for field in &expanded.fields {
        assert_eq!(
            field.is_relation(),
            expanded.relation(&field.name).is_some(),
            "{}",
            field.name
        );
    }
}
