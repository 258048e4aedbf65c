use std::io::Read;

use icetype_core::{Dialect, parse_schema_str, unified_type_mapping, validate_schema};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let schema = parse_schema_str(&input)?;

    let report = validate_schema(&schema);
    for issue in report.errors.iter().chain(report.warnings.iter()) {
        eprintln!("{:?} {} at {}: {}", issue.severity, issue.code, issue.path, issue.message);
    }
    if !report.valid {
        std::process::exit(1);
    }

    for field in schema.fields.iter().filter(|field| !field.is_relation()) {
        let mapped = unified_type_mapping(&field.type_expression(), Dialect::Postgres)?;
        println!("{}\t{}", field.name, mapped);
    }
    Ok(())
}
