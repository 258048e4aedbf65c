//! Static primitive-to-dialect type table.
//!
//! Downstream adapters render DDL from these strings; the table itself knows
//! nothing about SQL syntax beyond column type spelling.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::TypeMappingError;
use crate::grammar;

/// Target type system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Mysql,
    Sqlite,
    Clickhouse,
    Duckdb,
    Iceberg,
}

const ALL_DIALECTS: [Dialect; 6] = [
    Dialect::Postgres,
    Dialect::Mysql,
    Dialect::Sqlite,
    Dialect::Clickhouse,
    Dialect::Duckdb,
    Dialect::Iceberg,
];

impl Dialect {
    /// Lowercase dialect name, as accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Clickhouse => "clickhouse",
            Dialect::Duckdb => "duckdb",
            Dialect::Iceberg => "iceberg",
        }
    }

    /// Dialects with a native array column type.
    pub fn supports_arrays(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Clickhouse | Dialect::Duckdb)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = TypeMappingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ALL_DIALECTS
            .iter()
            .copied()
            .find(|dialect| dialect.as_str() == normalized)
            .ok_or_else(|| TypeMappingError::InvalidDialect {
                dialect: value.to_string(),
                valid: ALL_DIALECTS.iter().map(Dialect::as_str).collect(),
            })
    }
}

struct TypeRow {
    name: &'static str,
    postgres: &'static str,
    mysql: &'static str,
    sqlite: &'static str,
    clickhouse: &'static str,
    duckdb: &'static str,
    iceberg: &'static str,
}

impl TypeRow {
    fn get(&self, dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Postgres => self.postgres,
            Dialect::Mysql => self.mysql,
            Dialect::Sqlite => self.sqlite,
            Dialect::Clickhouse => self.clickhouse,
            Dialect::Duckdb => self.duckdb,
            Dialect::Iceberg => self.iceberg,
        }
    }
}

macro_rules! row {
    (
        $name:literal,
        $pg:literal,
        $my:literal,
        $lite:literal,
        $ch:literal,
        $duck:literal,
        $ice:literal
    ) => {
        TypeRow {
            name: $name,
            postgres: $pg,
            mysql: $my,
            sqlite: $lite,
            clickhouse: $ch,
            duckdb: $duck,
            iceberg: $ice,
        }
    };
}

#[rustfmt::skip]
const TYPE_TABLE: &[TypeRow] = &[
    row!("string",      "TEXT",             "VARCHAR(255)", "TEXT",    "String",               "VARCHAR",     "string"),
    row!("text",        "TEXT",             "TEXT",         "TEXT",    "String",               "VARCHAR",     "string"),
    row!("int",         "INTEGER",          "INT",          "INTEGER", "Int32",                "INTEGER",     "int"),
    row!("long",        "BIGINT",           "BIGINT",       "INTEGER", "Int64",                "BIGINT",      "long"),
    row!("bigint",      "BIGINT",           "BIGINT",       "INTEGER", "Int64",                "BIGINT",      "long"),
    row!("float",       "REAL",             "FLOAT",        "REAL",    "Float32",              "FLOAT",       "float"),
    row!("double",      "DOUBLE PRECISION", "DOUBLE",       "REAL",    "Float64",              "DOUBLE",      "double"),
    row!("bool",        "BOOLEAN",          "TINYINT(1)",   "INTEGER", "Bool",                 "BOOLEAN",     "boolean"),
    row!("boolean",     "BOOLEAN",          "TINYINT(1)",   "INTEGER", "Bool",                 "BOOLEAN",     "boolean"),
    row!("uuid",        "UUID",             "CHAR(36)",     "TEXT",    "UUID",                 "UUID",        "uuid"),
    row!("timestamp",   "TIMESTAMP",        "DATETIME",     "TEXT",    "DateTime64(3)",        "TIMESTAMP",   "timestamp"),
    row!("timestamptz", "TIMESTAMPTZ",      "TIMESTAMP",    "TEXT",    "DateTime64(3, 'UTC')", "TIMESTAMPTZ", "timestamptz"),
    row!("date",        "DATE",             "DATE",         "TEXT",    "Date32",               "DATE",        "date"),
    row!("time",        "TIME",             "TIME",         "TEXT",    "String",               "TIME",        "time"),
    row!("json",        "JSONB",            "JSON",         "TEXT",    "String",               "JSON",        "string"),
    row!("binary",      "BYTEA",            "BLOB",         "BLOB",    "String",               "BLOB",        "binary"),
    row!("decimal",     "DECIMAL",          "DECIMAL",      "REAL",    "Decimal(38, 9)",       "DECIMAL",     "decimal(38, 9)"),
    row!("varchar",     "VARCHAR",          "VARCHAR(255)", "TEXT",    "String",               "VARCHAR",     "string"),
    row!("char",        "CHAR",             "CHAR(1)",      "TEXT",    "FixedString(1)",       "CHAR",        "string"),
];

fn lookup_row(name: &str) -> Option<&'static TypeRow> {
    let normalized = name.trim().to_ascii_lowercase();
    TYPE_TABLE.iter().find(|row| row.name == normalized)
}

/// Names of all primitive types, in table order.
pub fn primitive_names() -> Vec<&'static str> {
    TYPE_TABLE.iter().map(|row| row.name).collect()
}

/// Returns true when `name` is a known primitive base type.
pub fn is_known_type(name: &str) -> bool {
    lookup_row(name).is_some()
}

/// Every supported dialect in table column order.
pub fn all_dialects() -> &'static [Dialect] {
    &ALL_DIALECTS
}

/// Primitive name to dialect type for every row of the table.
pub fn dialect_mappings(dialect: Dialect) -> BTreeMap<&'static str, &'static str> {
    TYPE_TABLE
        .iter()
        .map(|row| (row.name, row.get(dialect)))
        .collect()
}

/// Cross-dialect row for one IceType type expression.
///
/// Dialects that cannot represent the type (arrays outside postgres,
/// clickhouse and duckdb) are absent from `mappings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedMapping {
    pub ice_type: String,
    pub mappings: BTreeMap<Dialect, String>,
}

impl UnifiedMapping {
    /// Rendered type for `dialect`, or `None` when it has no representation.
    pub fn get(&self, dialect: Dialect) -> Option<&str> {
        self.mappings.get(&dialect).map(String::as_str)
    }
}

struct TypeExpr {
    row: &'static TypeRow,
    params: Vec<u32>,
    is_array: bool,
}

fn parse_type_expr(ice_type: &str) -> Result<TypeExpr, TypeMappingError> {
    let unknown = |valid: Vec<&'static str>| TypeMappingError::UnknownType {
        type_name: ice_type.trim().to_string(),
        valid,
    };

    let ast = match grammar::parse_field_type(ice_type) {
        Ok(ast) if ast.default.is_none() => ast,
        _ => return Err(unknown(primitive_names())),
    };
    let row = lookup_row(&ast.base).ok_or_else(|| unknown(primitive_names()))?;

    let arity_ok = match row.name {
        "decimal" => ast.params.len() <= 2,
        "varchar" | "char" => ast.params.len() <= 1,
        _ => ast.params.is_empty(),
    };
    if !arity_ok {
        return Err(TypeMappingError::InvalidParams {
            type_name: ice_type.trim().to_string(),
            reason: format!("'{}' does not accept {} parameters", row.name, ast.params.len()),
        });
    }
    if let [precision, scale] = ast.params.as_slice() {
        if scale > precision {
            return Err(TypeMappingError::InvalidParams {
                type_name: ice_type.trim().to_string(),
                reason: format!("scale {scale} exceeds precision {precision}"),
            });
        }
    }

    Ok(TypeExpr {
        row,
        params: ast.params,
        is_array: ast.is_array,
    })
}

fn scalar_type(expr: &TypeExpr, dialect: Dialect) -> String {
    match (expr.row.name, expr.params.as_slice()) {
        ("decimal", [precision, rest @ ..]) => {
            let scale = rest.first().copied().unwrap_or(0);
            match dialect {
                Dialect::Postgres | Dialect::Mysql | Dialect::Duckdb => {
                    format!("DECIMAL({precision}, {scale})")
                }
                Dialect::Sqlite => "REAL".to_string(),
                Dialect::Clickhouse => format!("Decimal({precision}, {scale})"),
                Dialect::Iceberg => format!("decimal({precision}, {scale})"),
            }
        }
        ("varchar", [length]) => match dialect {
            Dialect::Postgres | Dialect::Mysql | Dialect::Duckdb => format!("VARCHAR({length})"),
            Dialect::Sqlite => "TEXT".to_string(),
            Dialect::Clickhouse => "String".to_string(),
            Dialect::Iceberg => "string".to_string(),
        },
        ("char", [length]) => match dialect {
            Dialect::Postgres | Dialect::Mysql | Dialect::Duckdb => format!("CHAR({length})"),
            Dialect::Sqlite => "TEXT".to_string(),
            Dialect::Clickhouse => format!("FixedString({length})"),
            Dialect::Iceberg => "string".to_string(),
        },
        _ => expr.row.get(dialect).to_string(),
    }
}

fn render(expr: &TypeExpr, dialect: Dialect, ice_type: &str) -> Result<String, TypeMappingError> {
    let scalar = scalar_type(expr, dialect);
    if !expr.is_array {
        return Ok(scalar);
    }

    match dialect {
        Dialect::Postgres | Dialect::Duckdb => Ok(format!("{scalar}[]")),
        Dialect::Clickhouse => Ok(format!("Array({scalar})")),
        Dialect::Mysql | Dialect::Sqlite | Dialect::Iceberg => {
            Err(TypeMappingError::UnsupportedArray {
                type_name: ice_type.trim().to_string(),
                dialect: dialect.to_string(),
            })
        }
    }
}

/// Map an IceType type expression (`uuid`, `decimal(10,2)`, `string[]`) to a dialect.
///
/// Matching is case-insensitive and ignores surrounding whitespace and a
/// trailing field modifier.
pub fn unified_type_mapping(ice_type: &str, dialect: Dialect) -> Result<String, TypeMappingError> {
    let expr = parse_type_expr(ice_type)?;
    render(&expr, dialect, ice_type)
}

/// Like [`unified_type_mapping`] with the dialect given by name.
pub fn unified_type_mapping_for(ice_type: &str, dialect: &str) -> Result<String, TypeMappingError> {
    unified_type_mapping(ice_type, dialect.parse()?)
}

/// Full cross-dialect row for a type expression.
pub fn unified_mapping(ice_type: &str) -> Result<UnifiedMapping, TypeMappingError> {
    let expr = parse_type_expr(ice_type)?;
    let mappings = ALL_DIALECTS
        .iter()
        .filter_map(|dialect| {
            render(&expr, *dialect, ice_type)
                .ok()
                .map(|mapped| (*dialect, mapped))
        })
        .collect();

    Ok(UnifiedMapping {
        ice_type: ice_type.trim().to_ascii_lowercase(),
        mappings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_primitive_to_every_dialect() {
        for name in primitive_names() {
            for dialect in all_dialects() {
                let mapped = unified_type_mapping(name, *dialect)
                    .unwrap_or_else(|err| panic!("{name}/{dialect}: {err}"));
                assert!(!mapped.is_empty());
            }
        }
    }

    #[test]
    fn formats_parametric_types() {
        let cases = [
            ("decimal(10,2)", Dialect::Postgres, "DECIMAL(10, 2)"),
            ("decimal(10, 2)", Dialect::Clickhouse, "Decimal(10, 2)"),
            ("decimal(10,2)", Dialect::Iceberg, "decimal(10, 2)"),
            ("decimal(10,2)", Dialect::Sqlite, "REAL"),
            ("decimal(12)", Dialect::Mysql, "DECIMAL(12, 0)"),
            ("varchar(64)", Dialect::Postgres, "VARCHAR(64)"),
            ("varchar(64)", Dialect::Sqlite, "TEXT"),
            ("char(2)", Dialect::Clickhouse, "FixedString(2)"),
            ("char(2)", Dialect::Sqlite, "TEXT"),
        ];
        for (input, dialect, expected) in cases {
            assert_eq!(unified_type_mapping(input, dialect).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn arrays_only_map_for_capable_dialects() {
        assert_eq!(
            unified_type_mapping("string[]", Dialect::Postgres).unwrap(),
            "TEXT[]"
        );
        assert_eq!(
            unified_type_mapping("int[]", Dialect::Clickhouse).unwrap(),
            "Array(Int32)"
        );
        assert_eq!(
            unified_type_mapping("decimal(5,1)[]", Dialect::Duckdb).unwrap(),
            "DECIMAL(5, 1)[]"
        );
        for dialect in [Dialect::Mysql, Dialect::Sqlite, Dialect::Iceberg] {
            let err = unified_type_mapping("string[]", dialect).unwrap_err();
            assert_eq!(err.code(), "UNSUPPORTED_ARRAY");
        }
    }

    #[test]
    fn matching_is_case_insensitive_and_trimmed() {
        assert_eq!(
            unified_type_mapping("  UUID ", Dialect::Sqlite).unwrap(),
            "TEXT"
        );
        assert_eq!(
            unified_type_mapping("Timestamp!", Dialect::Clickhouse).unwrap(),
            "DateTime64(3)"
        );
    }

    #[test]
    fn unknown_types_list_valid_names() {
        let err = unified_type_mapping("money", Dialect::Postgres).unwrap_err();
        match err {
            TypeMappingError::UnknownType { type_name, valid } => {
                assert_eq!(type_name, "money");
                assert!(valid.contains(&"decimal"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(unified_type_mapping("int = 3", Dialect::Postgres).is_err());
        assert!(unified_type_mapping("", Dialect::Postgres).is_err());
    }

    #[test]
    fn rejects_bad_params() {
        let err = unified_type_mapping("int(4)", Dialect::Postgres).unwrap_err();
        assert_eq!(err.code(), "INVALID_TYPE_PARAMS");
    }

    #[test]
    fn rejects_decimal_scale_above_precision() {
        let err = unified_type_mapping("decimal(2,5)", Dialect::Postgres).unwrap_err();
        assert_eq!(err.code(), "INVALID_TYPE_PARAMS");
        assert!(err.to_string().contains("scale 5 exceeds precision 2"));
        assert_eq!(
            unified_type_mapping("decimal(5,5)", Dialect::Postgres).unwrap(),
            "DECIMAL(5, 5)"
        );
    }

    #[test]
    fn dialect_names_parse() {
        assert_eq!(" DuckDB ".parse::<Dialect>().unwrap(), Dialect::Duckdb);
        let err = "oracle".parse::<Dialect>().unwrap_err();
        assert_eq!(err.code(), "INVALID_DIALECT");
        assert!(unified_type_mapping_for("int", "oracle").is_err());
        assert_eq!(unified_type_mapping_for("int", "mysql").unwrap(), "INT");
    }

    #[test]
    fn unified_row_omits_unsupported_dialects() {
        let row = unified_mapping("uuid").unwrap();
        assert_eq!(row.mappings.len(), 6);
        assert_eq!(row.get(Dialect::Mysql), Some("CHAR(36)"));

        let row = unified_mapping("int[]").unwrap();
        assert_eq!(row.mappings.len(), 3);
        assert_eq!(row.get(Dialect::Sqlite), None);
    }

    #[test]
    fn dialect_table_covers_all_primitives() {
        let mappings = dialect_mappings(Dialect::Duckdb);
        assert_eq!(mappings.len(), primitive_names().len());
        assert_eq!(mappings["json"], "JSON");
        assert_eq!(all_dialects().len(), 6);
    }
}
