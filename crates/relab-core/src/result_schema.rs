//! Inferred output schemas and the attribute resolution contract
//!
//! A `ResultSchema` describes the output of any algebra or SQL
//! subexpression: typed columns grouped by the relation or alias that
//! contributed them, plus the ordered positional attribute list. Columns
//! with no stable table identity (set-operation results, merged join keys,
//! aggregation outputs) live under the `None` group key.

use crate::schema::TableSchema;
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// An attribute reference as written in a query — possibly qualified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Column name
    pub name: String,
    /// Qualifier; `None` means the reference must be resolved from context
    pub relation: Option<String>,
}

impl Attribute {
    /// Unqualified reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: None,
        }
    }

    /// Qualified reference (`relation.name`)
    pub fn qualified(relation: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: Some(relation.into()),
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.relation {
            Some(rel) => write!(f, "{rel}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A resolved, typed output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedAttribute {
    /// Column name
    pub name: String,
    /// Inferred type
    pub data_type: DataType,
}

impl TypedAttribute {
    /// Create a typed attribute
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A successful resolution: the matched column and its group key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAttribute<'a> {
    /// Group that contributed the column; `None` for shared/synthetic columns
    pub relation: Option<&'a str>,
    /// The matched column
    pub attribute: &'a TypedAttribute,
}

/// Outcome of resolving an attribute reference against a `ResultSchema`.
///
/// This is total: resolution never fails, it reports zero, one, or many
/// matches. Validators translate the outcomes into their own errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// No output column matches the reference
    NotFound,
    /// Exactly one match
    Unique(ResolvedAttribute<'a>),
    /// An unqualified name provided by several relations; carries every
    /// contributing relation or alias
    Ambiguous(Vec<String>),
}

impl<'a> Resolution<'a> {
    /// The resolved column, if unique
    pub fn unique(&self) -> Option<ResolvedAttribute<'a>> {
        match self {
            Resolution::Unique(r) => Some(*r),
            _ => None,
        }
    }
}

/// Output schema of a query subexpression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSchema {
    /// Columns grouped by contributing relation/alias; group keys are unique
    groups: Vec<(Option<String>, Vec<TypedAttribute>)>,
    /// Ordered positional output columns
    attributes: Vec<TypedAttribute>,
}

impl ResultSchema {
    /// Empty schema
    pub fn empty() -> Self {
        Self::default()
    }

    /// Schema of a base relation: one group keyed by the relation name
    pub fn from_table(name: &str, table: &TableSchema) -> Self {
        let attrs: Vec<TypedAttribute> = table
            .columns
            .iter()
            .map(|c| TypedAttribute::new(c.name.clone(), c.data_type))
            .collect();
        Self {
            groups: vec![(Some(name.to_string()), attrs.clone())],
            attributes: attrs,
        }
    }

    /// Schema with a single group under the given key; the positional list
    /// follows the group
    pub fn under_key(key: Option<String>, attrs: Vec<TypedAttribute>) -> Self {
        Self {
            groups: vec![(key, attrs.clone())],
            attributes: attrs,
        }
    }

    /// Schema from explicit groups; the positional list is the groups
    /// flattened in order
    pub fn from_groups(groups: Vec<(Option<String>, Vec<TypedAttribute>)>) -> Self {
        let attributes = groups.iter().flat_map(|(_, a)| a.iter().cloned()).collect();
        Self { groups, attributes }
    }

    /// Schema from explicit groups and an explicit positional list (used by
    /// projection, where the requested order may interleave groups)
    pub fn with_attributes(
        groups: Vec<(Option<String>, Vec<TypedAttribute>)>,
        attributes: Vec<TypedAttribute>,
    ) -> Self {
        Self { groups, attributes }
    }

    /// The ordered positional output columns
    pub fn attributes(&self) -> &[TypedAttribute] {
        &self.attributes
    }

    /// The groups, in order
    pub fn groups(&self) -> &[(Option<String>, Vec<TypedAttribute>)] {
        &self.groups
    }

    /// Group keys that are actual relation/alias names
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().filter_map(|(k, _)| k.as_deref())
    }

    /// Whether any output column has the given name (case-insensitive)
    pub fn contains_name(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Resolve an attribute reference. Total: returns zero, one, or many
    /// matches, never an error.
    ///
    /// Unqualified names check the `None` group first — a column merged
    /// there by a natural join resolves uniquely even though the per-side
    /// qualified copies still exist.
    pub fn resolve(&self, attr: &Attribute) -> Resolution<'_> {
        match &attr.relation {
            Some(rel) => {
                let group = self
                    .groups
                    .iter()
                    .find(|(k, _)| k.as_deref().is_some_and(|k| k.eq_ignore_ascii_case(rel)));
                match group {
                    Some((key, cols)) => cols
                        .iter()
                        .find(|c| c.name.eq_ignore_ascii_case(&attr.name))
                        .map(|c| {
                            Resolution::Unique(ResolvedAttribute {
                                relation: key.as_deref(),
                                attribute: c,
                            })
                        })
                        .unwrap_or(Resolution::NotFound),
                    None => Resolution::NotFound,
                }
            }
            None => {
                // Shared/synthetic columns win outright.
                for (key, cols) in &self.groups {
                    if key.is_none() {
                        if let Some(c) =
                            cols.iter().find(|c| c.name.eq_ignore_ascii_case(&attr.name))
                        {
                            return Resolution::Unique(ResolvedAttribute {
                                relation: None,
                                attribute: c,
                            });
                        }
                    }
                }
                let mut matches: Vec<ResolvedAttribute<'_>> = Vec::new();
                for (key, cols) in &self.groups {
                    if let Some(k) = key.as_deref() {
                        if let Some(c) =
                            cols.iter().find(|c| c.name.eq_ignore_ascii_case(&attr.name))
                        {
                            matches.push(ResolvedAttribute {
                                relation: Some(k),
                                attribute: c,
                            });
                        }
                    }
                }
                match matches.len() {
                    0 => Resolution::NotFound,
                    1 => Resolution::Unique(matches[0]),
                    _ => Resolution::Ambiguous(
                        matches
                            .iter()
                            .filter_map(|m| m.relation.map(str::to_string))
                            .collect(),
                    ),
                }
            }
        }
    }

    /// Merge for a cartesian product: groups with the same key are
    /// combined, and a column name occurring on both sides of one key is
    /// overwritten by the right side.
    pub fn merge_cartesian(left: &ResultSchema, right: &ResultSchema) -> ResultSchema {
        let mut groups = left.groups.clone();
        for (key, cols) in &right.groups {
            let existing = groups.iter_mut().find(|(k, _)| match (k, key) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            });
            match existing {
                Some((_, target)) => {
                    for col in cols {
                        match target
                            .iter_mut()
                            .find(|c| c.name.eq_ignore_ascii_case(&col.name))
                        {
                            Some(slot) => *slot = col.clone(),
                            None => target.push(col.clone()),
                        }
                    }
                }
                None => groups.push((key.clone(), cols.clone())),
            }
        }
        ResultSchema::from_groups(groups)
    }

    /// Merge for a natural/semi/anti join: every column name present on
    /// both sides is folded into a single shared entry under the `None`
    /// key, typed as the dominant of the two sides. The per-side qualified
    /// entries remain resolvable.
    pub fn merge_natural(left: &ResultSchema, right: &ResultSchema) -> ResultSchema {
        let shared = Self::shared_names(left, right);
        Self::merge_on(left, right, &shared)
    }

    /// Merge two schemas folding exactly the given column names under the
    /// `None` key (the USING-join variant of `merge_natural`). Names absent
    /// from either side are skipped; the caller validates existence.
    pub fn merge_on(left: &ResultSchema, right: &ResultSchema, names: &[String]) -> ResultSchema {
        let mut shared_cols = Vec::new();
        for name in names {
            let (Some(lt), Some(rt)) = (left.find_name(name), right.find_name(name)) else {
                continue;
            };
            shared_cols.push(TypedAttribute::new(
                lt.name.clone(),
                lt.data_type.dominant_with(&rt.data_type),
            ));
        }

        let mut groups = Vec::with_capacity(left.groups.len() + right.groups.len() + 1);
        if !shared_cols.is_empty() {
            groups.push((None, shared_cols.clone()));
        }
        groups.extend(left.groups.iter().cloned());
        groups.extend(right.groups.iter().cloned());

        let is_shared = |name: &str| {
            shared_cols
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(name))
        };
        let mut attributes = shared_cols.clone();
        attributes.extend(
            left.attributes
                .iter()
                .filter(|a| !is_shared(&a.name))
                .cloned(),
        );
        attributes.extend(
            right
                .attributes
                .iter()
                .filter(|a| !is_shared(&a.name))
                .cloned(),
        );
        ResultSchema { groups, attributes }
    }

    /// Re-key the flattened column set entirely under `alias`
    pub fn re_keyed(&self, alias: &str) -> ResultSchema {
        ResultSchema::under_key(Some(alias.to_string()), self.attributes.clone())
    }

    /// Column names present in both positional lists, in left order
    pub fn shared_names(left: &ResultSchema, right: &ResultSchema) -> Vec<String> {
        let mut out = Vec::new();
        for a in &left.attributes {
            if right.contains_name(&a.name)
                && !out.iter().any(|n: &String| n.eq_ignore_ascii_case(&a.name))
            {
                out.push(a.name.clone());
            }
        }
        out
    }

    /// First positional column with the given name (case-insensitive)
    pub fn find_name(&self, name: &str) -> Option<&TypedAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Number of positional output columns
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether there are no output columns
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
#[path = "result_schema_test.rs"]
mod tests;
