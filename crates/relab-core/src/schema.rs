//! Input schema catalog: table name → ordered typed columns
//!
//! Supplied once per validation/transpilation call by the caller (schema
//! introspection is an external concern) and treated as read-only for the
//! call's duration.

use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, typed column of a base table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared SQL type
    pub data_type: DataType,
}

impl Column {
    /// Create a column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Schema of a single base table — an ordered column list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Ordered list of columns
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Create a table schema from (name, type) pairs
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, data_type)| Column::new(name, data_type))
                .collect(),
        }
    }

    /// Find a column by name (case-insensitive)
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The full input catalog: table name → table schema.
///
/// Key order is irrelevant to the semantics; a `BTreeMap` keeps iteration
/// (and therefore diagnostics) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationalSchema {
    tables: BTreeMap<String, TableSchema>,
}

impl RelationalSchema {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table
    pub fn insert(&mut self, name: impl Into<String>, table: TableSchema) {
        self.tables.insert(name.into(), table);
    }

    /// Builder-style `insert`
    pub fn with_table(mut self, name: impl Into<String>, table: TableSchema) -> Self {
        self.insert(name, table);
        self
    }

    /// Look up a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name).or_else(|| {
            self.tables
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// Whether a table exists (case-insensitive)
    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// All table names, sorted
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the catalog has no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableSchema {
        TableSchema::new([
            ("id", DataType::Integer),
            ("name", DataType::Varchar),
            ("active", DataType::Boolean),
        ])
    }

    #[test]
    fn test_find_column_case_insensitive() {
        let t = users();
        assert_eq!(t.find_column("ID").map(|c| c.data_type), Some(DataType::Integer));
        assert!(t.find_column("missing").is_none());
    }

    #[test]
    fn test_table_lookup() {
        let schema = RelationalSchema::new().with_table("Users", users());
        assert!(schema.contains_table("Users"));
        assert!(schema.contains_table("users"));
        assert!(!schema.contains_table("orders"));
        assert_eq!(schema.table("USERS").map(|t| t.len()), Some(3));
    }

    #[test]
    fn test_column_order_preserved() {
        let t = users();
        let names: Vec<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "active"]);
    }
}
