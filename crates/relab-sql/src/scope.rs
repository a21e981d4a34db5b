//! Scope model for SQL semantic analysis
//!
//! A SELECT owns one `Scope`: the tables its FROM clause brought in, the
//! projection items it declares, and (when grouped) the grouped-expression
//! set. Derived tables and subqueries open child scopes whose parent
//! pointer is the enclosing scope, which is what lets a correlated
//! subquery resolve outer columns.

use relab_core::{
    Attribute, DataType, Resolution, ResultSchema, SemanticError, SemanticResult,
};

/// The FROM-clause side of a scope: alias → typed columns
#[derive(Debug, Default)]
pub struct TablesScope {
    schema: ResultSchema,
    labels: Vec<String>,
}

impl TablesScope {
    /// Empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope over an already-merged schema (set-operation outputs)
    pub fn from_result_schema(schema: ResultSchema) -> Self {
        Self {
            schema,
            labels: Vec::new(),
        }
    }

    /// The merged schema of every table in scope
    pub fn schema(&self) -> &ResultSchema {
        &self.schema
    }

    fn register_label(&mut self, label: &str) -> SemanticResult<()> {
        if self
            .labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(label))
        {
            return Err(SemanticError::DuplicateAlias {
                alias: label.to_string(),
                position: None,
            });
        }
        self.labels.push(label.to_string());
        Ok(())
    }

    /// Bring a table (or aliased derived table) into scope with a plain
    /// cartesian merge
    pub fn add(&mut self, label: &str, table: ResultSchema) -> SemanticResult<()> {
        self.register_label(label)?;
        self.schema = ResultSchema::merge_cartesian(&self.schema, &table);
        Ok(())
    }

    /// Bring a table into scope via NATURAL JOIN: every shared column name
    /// is folded under the unqualified key
    pub fn add_natural(&mut self, label: &str, table: ResultSchema) -> SemanticResult<()> {
        self.register_label(label)?;
        let shared = ResultSchema::shared_names(&self.schema, &table);
        self.check_join_types(&table, &shared)?;
        self.schema = ResultSchema::merge_natural(&self.schema, &table);
        Ok(())
    }

    /// Bring a table into scope via `USING (columns)`: the listed columns
    /// are folded under the unqualified key
    pub fn add_using(
        &mut self,
        label: &str,
        table: ResultSchema,
        columns: &[String],
    ) -> SemanticResult<()> {
        self.register_label(label)?;
        for col in columns {
            if self.schema.find_name(col).is_none() || table.find_name(col).is_none() {
                return Err(SemanticError::AttributeNotFound {
                    name: col.clone(),
                    position: None,
                });
            }
        }
        self.check_join_types(&table, columns)?;
        self.schema = ResultSchema::merge_on(&self.schema, &table, columns);
        Ok(())
    }

    fn check_join_types(&self, right: &ResultSchema, shared: &[String]) -> SemanticResult<()> {
        for name in shared {
            let (Some(lt), Some(rt)) = (self.schema.find_name(name), right.find_name(name))
            else {
                continue;
            };
            if !lt.data_type.is_comparable_with(&rt.data_type) {
                return Err(SemanticError::JoinAttributeTypeMismatch {
                    attribute: name.clone(),
                    left: lt.data_type,
                    right: rt.data_type,
                    position: None,
                });
            }
        }
        Ok(())
    }

    /// Resolve a column reference against the tables in this scope only
    pub fn resolve(&self, attr: &Attribute) -> Resolution<'_> {
        self.schema.resolve(attr)
    }
}

/// One declared SELECT item
#[derive(Debug, Clone)]
pub struct ProjectionItem {
    /// Output name (alias, or inferred from the expression)
    pub name: Option<String>,
    /// Whether the name was an explicit alias
    pub explicit_alias: bool,
    /// Canonical structural key of the expression
    pub expr_key: String,
    /// Resolved type
    pub data_type: DataType,
    /// Whether the item is aggregate-backed
    pub is_aggregate: bool,
}

/// The SELECT-item side of a scope
#[derive(Debug, Default)]
pub struct ProjectionsScope {
    items: Vec<ProjectionItem>,
}

impl ProjectionsScope {
    /// Empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one item; duplicate explicit aliases are rejected
    pub fn add(&mut self, item: ProjectionItem) -> SemanticResult<()> {
        if item.explicit_alias {
            if let Some(name) = &item.name {
                let taken = self.items.iter().any(|i| {
                    i.explicit_alias
                        && i.name
                            .as_deref()
                            .is_some_and(|n| n.eq_ignore_ascii_case(name))
                });
                if taken {
                    return Err(SemanticError::DuplicateAlias {
                        alias: name.clone(),
                        position: None,
                    });
                }
            }
        }
        self.items.push(item);
        Ok(())
    }

    /// All declared items, in select-list order
    pub fn items(&self) -> &[ProjectionItem] {
        &self.items
    }

    /// Number of output columns
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items were declared yet
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find an item by output name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&ProjectionItem> {
        self.items.iter().find(|i| {
            i.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Find an item by structural key
    pub fn find_by_key(&self, key: &str) -> Option<&ProjectionItem> {
        self.items.iter().find(|i| i.expr_key == key)
    }
}

/// Grouped expressions of a GROUP BY clause, tracked by structural key and
/// by select-alias name
#[derive(Debug, Default)]
pub struct GroupByScope {
    keys: Vec<String>,
    names: Vec<String>,
}

impl GroupByScope {
    /// Empty grouped scope (HAVING without GROUP BY)
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grouped expression by structural key
    pub fn add_key(&mut self, key: String) {
        self.keys.push(key);
    }

    /// Record a grouped select alias
    pub fn add_name(&mut self, name: String) {
        self.names.push(name);
    }

    /// Whether an expression with this structural key is grouped
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Whether a column or alias of this name is grouped
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// One SELECT's scope, linked to its enclosing scope
#[derive(Debug)]
pub struct Scope<'p> {
    /// Tables visible to this SELECT
    pub tables: TablesScope,
    /// Items this SELECT declares
    pub projections: ProjectionsScope,
    /// Grouped expressions, when the scope is grouped
    pub group_by: Option<GroupByScope>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    /// New scope under an optional enclosing scope
    pub fn new(parent: Option<&'p Scope<'p>>) -> Self {
        Self {
            tables: TablesScope::new(),
            projections: ProjectionsScope::new(),
            group_by: None,
            parent,
        }
    }

    /// Whether this scope is grouped
    pub fn is_grouped(&self) -> bool {
        self.group_by.is_some()
    }

    /// Resolve a column reference, walking up the scope chain when the
    /// current scope has no match. An ambiguity in the current scope is
    /// reported as such, not shadowed by an outer match.
    pub fn resolve(&self, attr: &Attribute) -> Resolution<'_> {
        match self.tables.resolve(attr) {
            Resolution::NotFound => match self.parent {
                Some(parent) => parent.resolve(attr),
                None => Resolution::NotFound,
            },
            other => other,
        }
    }

    /// Whether a reference resolves in an enclosing scope rather than this
    /// one (i.e. the reference is correlated)
    pub fn is_correlated(&self, attr: &Attribute) -> bool {
        matches!(self.tables.resolve(attr), Resolution::NotFound)
            && self
                .parent
                .is_some_and(|p| !matches!(p.resolve(attr), Resolution::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relab_core::{DataType, TableSchema};

    fn users() -> ResultSchema {
        ResultSchema::from_table(
            "users",
            &TableSchema::new([("id", DataType::Integer), ("name", DataType::Varchar)]),
        )
    }

    fn orders() -> ResultSchema {
        ResultSchema::from_table(
            "orders",
            &TableSchema::new([("id", DataType::Integer), ("user_id", DataType::Integer)]),
        )
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut ts = TablesScope::new();
        ts.add("users", users()).unwrap();
        assert!(matches!(
            ts.add("USERS", users()),
            Err(SemanticError::DuplicateAlias { .. })
        ));
    }

    #[test]
    fn test_cartesian_add_leaves_shared_names_ambiguous() {
        let mut ts = TablesScope::new();
        ts.add("users", users()).unwrap();
        ts.add("orders", orders()).unwrap();
        assert!(matches!(
            ts.resolve(&Attribute::new("id")),
            Resolution::Ambiguous(_)
        ));
        assert!(ts.resolve(&Attribute::qualified("orders", "id")).unique().is_some());
    }

    #[test]
    fn test_natural_add_folds_shared_names() {
        let mut ts = TablesScope::new();
        ts.add("users", users()).unwrap();
        ts.add_natural("orders", orders()).unwrap();
        let resolved = ts.resolve(&Attribute::new("id")).unique().unwrap();
        assert_eq!(resolved.relation, None);
    }

    #[test]
    fn test_using_folds_only_listed_columns() {
        let mut ts = TablesScope::new();
        ts.add("users", users()).unwrap();
        ts.add_using("orders", orders(), &["id".to_string()]).unwrap();
        assert!(ts.resolve(&Attribute::new("id")).unique().is_some());
    }

    #[test]
    fn test_using_unknown_column() {
        let mut ts = TablesScope::new();
        ts.add("users", users()).unwrap();
        assert!(matches!(
            ts.add_using("orders", orders(), &["zzz".to_string()]),
            Err(SemanticError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_scope_chain_resolution() {
        let mut outer = Scope::new(None);
        outer.tables.add("users", users()).unwrap();
        let mut inner = Scope::new(Some(&outer));
        inner.tables.add("orders", orders()).unwrap();

        // "name" only exists outside — correlated
        assert!(inner.resolve(&Attribute::new("name")).unique().is_some());
        assert!(inner.is_correlated(&Attribute::new("name")));
        // "user_id" is local
        assert!(!inner.is_correlated(&Attribute::new("user_id")));
        // local match shadows outer
        let id = inner.resolve(&Attribute::new("id")).unique().unwrap();
        assert_eq!(id.relation, Some("orders"));
    }

    #[test]
    fn test_projection_duplicate_alias() {
        let mut ps = ProjectionsScope::new();
        let item = |name: &str| ProjectionItem {
            name: Some(name.to_string()),
            explicit_alias: true,
            expr_key: name.to_string(),
            data_type: DataType::Integer,
            is_aggregate: false,
        };
        ps.add(item("total")).unwrap();
        assert!(matches!(
            ps.add(item("TOTAL")),
            Err(SemanticError::DuplicateAlias { .. })
        ));
    }

    #[test]
    fn test_group_by_scope_lookup() {
        let mut gs = GroupByScope::new();
        gs.add_key("users.id".to_string());
        gs.add_name("uid".to_string());
        assert!(gs.contains_key("users.id"));
        assert!(!gs.contains_key("users.name"));
        assert!(gs.contains_name("UID"));
    }
}
