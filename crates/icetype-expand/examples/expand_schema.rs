use icetype_core::{SchemaRegistry, parse_schema};
use icetype_expand::expand_relations;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut registry = SchemaRegistry::new();
    registry.register(parse_schema(&json!({
        "$type": "Customer",
        "id": "uuid!",
        "name": "string!",
        "address": "-> Address?",
    }))?);
    registry.register(parse_schema(&json!({
        "$type": "Address",
        "street": "string",
        "city": "string!",
    }))?);

    let order = parse_schema(&json!({
        "$type": "Order",
        "id": "uuid!",
        "total": "decimal(10, 2)!",
        "customer": "-> Customer",
    }))?;

    let expanded = expand_relations(&order, &["customer", "customer.address"], &registry)?;
    println!("{}", expanded.name);
    for field in &expanded.fields {
        let marker = if field.is_optional { "?" } else { "" };
        println!("  {}: {}{}", field.name, field.type_expression(), marker);
    }
    Ok(())
}
