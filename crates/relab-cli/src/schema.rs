//! Schema file loading
//!
//! The schema file maps table names to column-name→type mappings. YAML and
//! JSON both parse (JSON is a YAML subset); column order in the file is the
//! positional column order of the table.

use anyhow::{bail, Context, Result};
use relab_core::{DataType, RelationalSchema, TableSchema};
use std::path::Path;

/// Load a schema catalog from a YAML/JSON file
pub fn load(path: &Path) -> Result<RelationalSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read schema file {}", path.display()))?;
    let schema = parse(&text).with_context(|| format!("invalid schema file {}", path.display()))?;
    log::debug!("loaded {} tables from {}", schema.len(), path.display());
    Ok(schema)
}

/// Parse a schema catalog from YAML/JSON text
pub fn parse(text: &str) -> Result<RelationalSchema> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).context("schema is not valid YAML/JSON")?;
    let serde_yaml::Value::Mapping(tables) = value else {
        bail!("schema must be a mapping of table names to column mappings");
    };

    let mut schema = RelationalSchema::new();
    for (table_key, columns_value) in &tables {
        let table_name = string_key(table_key)?;
        let serde_yaml::Value::Mapping(columns) = columns_value else {
            bail!("table '{table_name}' must map column names to types");
        };
        let mut table = Vec::new();
        for (column_key, type_value) in columns {
            let column_name = string_key(column_key)?;
            let serde_yaml::Value::String(type_name) = type_value else {
                bail!("column '{table_name}.{column_name}' must name a type");
            };
            let data_type = DataType::parse(type_name).ok_or_else(|| {
                anyhow::anyhow!(
                    "column '{table_name}.{column_name}' has unknown type '{type_name}'"
                )
            })?;
            table.push((column_name, data_type));
        }
        schema.insert(table_name, TableSchema::new(table));
    }
    Ok(schema)
}

fn string_key(value: &serde_yaml::Value) -> Result<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        other => bail!("expected a name, found {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_schema() {
        let schema = parse(
            "products:\n  product_id: INTEGER\n  name: VARCHAR(40)\norders:\n  order_id: INTEGER\n",
        )
        .unwrap();
        assert!(schema.contains_table("products"));
        let products = schema.table("products").unwrap();
        assert_eq!(products.columns[0].name, "product_id");
        assert_eq!(products.columns[1].data_type, DataType::Varchar);
    }

    #[test]
    fn test_parse_json_schema() {
        let schema = parse(r#"{"t": {"a": "INT", "b": "DATE"}}"#).unwrap();
        assert_eq!(schema.table("t").unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(parse("t:\n  a: GEOMETRY\n").is_err());
    }

    #[test]
    fn test_non_mapping_rejected() {
        assert!(parse("- a\n- b\n").is_err());
    }
}
