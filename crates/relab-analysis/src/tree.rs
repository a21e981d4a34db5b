//! Visualization tree: one record per operator, each carrying its own
//! error list
//!
//! The builder never fails. Every subtree is re-validated independently
//! against the schema, so several simultaneous errors in one query all
//! surface, each localized to its own node.

use crate::validator::validate;
use relab_core::{Position, QueryError, RelationalSchema};
use relab_ra::{latex_condition, RaExpression, RaKind};
use serde::Serialize;

/// The annotated operator tree for a visualization client
#[derive(Debug, Clone, Serialize)]
pub struct QueryTree {
    /// Root node of the query
    pub root: TreeNode,
}

/// One operator node with display fields, subtree-local errors, and children
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    /// Stable preorder id, 0 at the root
    pub id: u32,
    /// Operator-specific display record
    #[serde(flatten)]
    pub kind: TreeNodeKind,
    /// Errors of this node's subtree alone (empty when it validates)
    pub errors: Vec<QueryError>,
    /// Operand subtrees, left to right
    pub children: Vec<TreeNode>,
    /// Source span of the operator, when parsed from text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Display fields per operator
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "operator", rename_all = "snake_case")]
pub enum TreeNodeKind {
    Relation {
        name: String,
    },
    Projection {
        attributes: Vec<String>,
    },
    Selection {
        condition: String,
    },
    Rename {
        alias: String,
    },
    SetOperation {
        kind: String,
    },
    Join {
        kind: String,
    },
    ThetaJoin {
        condition: String,
    },
    Division,
    GroupedAggregation {
        group_by: Vec<String>,
        aggregations: Vec<String>,
    },
    TopN {
        limit: u64,
        attribute: String,
    },
}

/// Build the annotated tree for a parsed query. Pure and total: validation
/// failures become node data, never errors.
pub fn build_tree(expr: &RaExpression, schema: &RelationalSchema) -> QueryTree {
    let mut next_id = 0;
    QueryTree {
        root: build_node(expr, schema, &mut next_id),
    }
}

fn build_node(expr: &RaExpression, schema: &RelationalSchema, next_id: &mut u32) -> TreeNode {
    let id = *next_id;
    *next_id += 1;

    let errors = match validate(expr, schema) {
        Ok(()) => Vec::new(),
        Err(e) => vec![e.to_query_error()],
    };

    let children = expr
        .children()
        .into_iter()
        .map(|child| build_node(child, schema, next_id))
        .collect();

    TreeNode {
        id,
        kind: display_kind(expr),
        errors,
        children,
        position: expr.position,
    }
}

fn display_kind(expr: &RaExpression) -> TreeNodeKind {
    match &expr.kind {
        RaKind::Relation { name } => TreeNodeKind::Relation { name: name.clone() },
        RaKind::Projection { attributes, .. } => TreeNodeKind::Projection {
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        },
        RaKind::Selection { condition, .. } => TreeNodeKind::Selection {
            condition: latex_condition(condition),
        },
        RaKind::Rename { alias, .. } => TreeNodeKind::Rename {
            alias: alias.clone(),
        },
        RaKind::SetOperation { kind, .. } => TreeNodeKind::SetOperation {
            kind: kind.name().to_string(),
        },
        RaKind::Join { kind, .. } => TreeNodeKind::Join {
            kind: kind.name().to_string(),
        },
        RaKind::ThetaJoin { condition, .. } => TreeNodeKind::ThetaJoin {
            condition: latex_condition(condition),
        },
        RaKind::Division { .. } => TreeNodeKind::Division,
        RaKind::GroupedAggregation {
            group_by,
            aggregations,
            ..
        } => TreeNodeKind::GroupedAggregation {
            group_by: group_by.iter().map(|a| a.to_string()).collect(),
            aggregations: aggregations
                .iter()
                .map(|agg| format!("{}({}) \u{2192} {}", agg.function.name(), agg.input, agg.output))
                .collect(),
        },
        RaKind::TopN {
            limit, attribute, ..
        } => TreeNodeKind::TopN {
            limit: *limit,
            attribute: attribute.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relab_core::{DataType, TableSchema};
    use relab_ra::parse;

    fn schema() -> RelationalSchema {
        RelationalSchema::new()
            .with_table(
                "R",
                TableSchema::new([("A", DataType::Integer), ("B", DataType::Varchar)]),
            )
            .with_table("S", TableSchema::new([("A", DataType::Integer)]))
    }

    #[test]
    fn test_preorder_ids() {
        let expr = parse("\\pi_{A} (R \\cup S)").unwrap();
        let tree = build_tree(&expr, &schema());
        assert_eq!(tree.root.id, 0);
        let union = &tree.root.children[0];
        assert_eq!(union.id, 1);
        assert_eq!(union.children[0].id, 2);
        assert_eq!(union.children[1].id, 3);
    }

    #[test]
    fn test_valid_tree_has_no_errors() {
        let expr = parse("\\sigma_{A = 1} R").unwrap();
        let tree = build_tree(&expr, &schema());
        assert!(tree.root.errors.is_empty());
        assert!(tree.root.children[0].errors.is_empty());
    }

    #[test]
    fn test_multiple_errors_localized_to_their_nodes() {
        // two independent mistakes: R ∪ S is arity-incompatible, and the
        // selection on the left references a missing attribute
        let expr = parse("\\sigma_{Z = 1} R \\cup S").unwrap();
        let tree = build_tree(&expr, &schema());

        // the root's subtree contains the selection failure, so it reports one
        assert!(!tree.root.errors.is_empty());
        let selection = &tree.root.children[0];
        assert_eq!(selection.errors.len(), 1);
        assert_eq!(selection.errors[0].title, "Attribute not found");
        // the bare relations below are individually fine
        assert!(selection.children[0].errors.is_empty());
        assert!(tree.root.children[1].errors.is_empty());
    }

    #[test]
    fn test_display_fields() {
        let expr = parse("T_{2, A} \\Gamma_{(A), ((A, count, n))} R").unwrap();
        let tree = build_tree(&expr, &schema());
        match &tree.root.kind {
            TreeNodeKind::TopN { limit, attribute } => {
                assert_eq!(*limit, 2);
                assert_eq!(attribute, "A");
            }
            other => panic!("expected top-n at the root, got {other:?}"),
        }
        match &tree.root.children[0].kind {
            TreeNodeKind::GroupedAggregation { aggregations, .. } => {
                assert_eq!(aggregations, &["count(A) \u{2192} n"]);
            }
            other => panic!("expected aggregation, got {other:?}"),
        }
    }

    #[test]
    fn test_tree_serializes_to_json() {
        let expr = parse("R \\bowtie S").unwrap();
        let tree = build_tree(&expr, &schema());
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["root"]["operator"], "join");
        assert_eq!(json["root"]["kind"], "natural join");
        assert_eq!(json["root"]["children"][0]["operator"], "relation");
    }
}
