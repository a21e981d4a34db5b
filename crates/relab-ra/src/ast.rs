//! Relational algebra operator tree
//!
//! Nodes are immutable; every combinator consumes its operand and returns a
//! fresh expression. Equality compares structure only — source positions
//! are diagnostics metadata, so a parsed tree equals the combinator-built
//! tree it denotes.

use relab_core::{Attribute, Position};
use serde::{Deserialize, Serialize};

/// Set operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOpKind {
    /// ∪
    Union,
    /// ∩
    Intersect,
    /// −
    Difference,
    /// ×
    Cartesian,
}

impl SetOpKind {
    /// Human-readable operator name
    pub fn name(&self) -> &'static str {
        match self {
            SetOpKind::Union => "union",
            SetOpKind::Intersect => "intersection",
            SetOpKind::Difference => "difference",
            SetOpKind::Cartesian => "cartesian product",
        }
    }
}

/// Join kind (theta joins are a separate node carrying their condition)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    /// ⋈ — natural join on every shared column name
    Natural,
    /// ⋉ — tuples of the left side with a natural-join partner
    Semi,
    /// ▷ — tuples of the left side without a natural-join partner
    Anti,
    /// ⟕
    Left,
    /// ⟖
    Right,
    /// ⟗
    Outer,
}

impl JoinKind {
    /// Human-readable operator name
    pub fn name(&self) -> &'static str {
        match self {
            JoinKind::Natural => "natural join",
            JoinKind::Semi => "semi join",
            JoinKind::Anti => "anti join",
            JoinKind::Left => "left outer join",
            JoinKind::Right => "right outer join",
            JoinKind::Outer => "full outer join",
        }
    }
}

/// Aggregation function of a grouped aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Parse a function name (case-insensitive)
    pub fn parse(name: &str) -> Option<AggregateFunction> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFunction::Count),
            "sum" => Some(AggregateFunction::Sum),
            "avg" => Some(AggregateFunction::Avg),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    /// Lowercase spelling, as written in the RA dialect
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Uppercase SQL spelling
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

/// One `(input, function, output)` triple of a grouped aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Aggregated input attribute
    pub input: Attribute,
    /// Aggregation function
    pub function: AggregateFunction,
    /// Output column name
    pub output: String,
}

impl Aggregation {
    /// Create an aggregation triple
    pub fn new(
        input: Attribute,
        function: AggregateFunction,
        output: impl Into<String>,
    ) -> Self {
        Self {
            input,
            function,
            output: output.into(),
        }
    }
}

/// Comparison operator of a boolean leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Literal comparison operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

/// Comparison operand: an attribute reference or a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Attribute(Attribute),
    Literal(Literal),
}

/// Boolean expression inside σ subscripts and theta-join conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooleanExpression {
    /// Structure of the expression
    pub kind: BoolKind,
    /// Source span, when parsed from text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Structure of a boolean expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoolKind {
    And {
        left: Box<BooleanExpression>,
        right: Box<BooleanExpression>,
    },
    Or {
        left: Box<BooleanExpression>,
        right: Box<BooleanExpression>,
    },
    Not {
        operand: Box<BooleanExpression>,
    },
    Comparison {
        op: ComparisonOp,
        left: Operand,
        right: Operand,
    },
}

impl PartialEq for BooleanExpression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl BooleanExpression {
    fn new(kind: BoolKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    /// Attach a source span
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Comparison leaf
    pub fn comparison(op: ComparisonOp, left: Operand, right: Operand) -> Self {
        Self::new(BoolKind::Comparison { op, left, right })
    }

    /// `attribute op literal` shorthand
    pub fn compare_literal(attr: Attribute, op: ComparisonOp, literal: Literal) -> Self {
        Self::comparison(op, Operand::Attribute(attr), Operand::Literal(literal))
    }

    /// `left.attr op right.attr` shorthand
    pub fn compare_attributes(left: Attribute, op: ComparisonOp, right: Attribute) -> Self {
        Self::comparison(op, Operand::Attribute(left), Operand::Attribute(right))
    }

    /// Conjunction
    pub fn and(self, other: BooleanExpression) -> Self {
        Self::new(BoolKind::And {
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    /// Disjunction
    pub fn or(self, other: BooleanExpression) -> Self {
        Self::new(BoolKind::Or {
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    /// Negation
    pub fn negate(self) -> Self {
        Self::new(BoolKind::Not {
            operand: Box::new(self),
        })
    }

    /// Every attribute referenced in the expression, left to right
    pub fn attributes(&self) -> Vec<&Attribute> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut Vec<&'a Attribute>) {
        match &self.kind {
            BoolKind::And { left, right } | BoolKind::Or { left, right } => {
                left.collect_attributes(out);
                right.collect_attributes(out);
            }
            BoolKind::Not { operand } => operand.collect_attributes(out),
            BoolKind::Comparison { left, right, .. } => {
                if let Operand::Attribute(a) = left {
                    out.push(a);
                }
                if let Operand::Attribute(a) = right {
                    out.push(a);
                }
            }
        }
    }

    /// Rebuild the expression with every attribute reference transformed.
    ///
    /// Used by the transpiler to redirect qualifiers at relations that were
    /// wrapped into aliased derived tables.
    pub fn map_attributes<F>(&self, f: &F) -> BooleanExpression
    where
        F: Fn(&Attribute) -> Attribute,
    {
        let map_operand = |op: &Operand| match op {
            Operand::Attribute(a) => Operand::Attribute(f(a)),
            Operand::Literal(l) => Operand::Literal(l.clone()),
        };
        let kind = match &self.kind {
            BoolKind::And { left, right } => BoolKind::And {
                left: Box::new(left.map_attributes(f)),
                right: Box::new(right.map_attributes(f)),
            },
            BoolKind::Or { left, right } => BoolKind::Or {
                left: Box::new(left.map_attributes(f)),
                right: Box::new(right.map_attributes(f)),
            },
            BoolKind::Not { operand } => BoolKind::Not {
                operand: Box::new(operand.map_attributes(f)),
            },
            BoolKind::Comparison { op, left, right } => BoolKind::Comparison {
                op: *op,
                left: map_operand(left),
                right: map_operand(right),
            },
        };
        BooleanExpression {
            kind,
            position: self.position,
        }
    }
}

/// A relational algebra expression: one operator node plus its operands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaExpression {
    /// The operator and its operands
    pub kind: RaKind,
    /// Source span, when parsed from text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// The operators of the algebra
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaKind {
    /// Base relation reference
    Relation { name: String },
    /// π — replaces the operand's output columns
    Projection {
        attributes: Vec<Attribute>,
        input: Box<RaExpression>,
    },
    /// σ — filters tuples by a boolean expression
    Selection {
        condition: BooleanExpression,
        input: Box<RaExpression>,
    },
    /// ρ — re-keys the operand's columns under a new relation alias
    Rename {
        alias: String,
        input: Box<RaExpression>,
    },
    /// ∪ ∩ − ×
    SetOperation {
        kind: SetOpKind,
        left: Box<RaExpression>,
        right: Box<RaExpression>,
    },
    /// ⋈ ⋉ ▷ ⟕ ⟖ ⟗ — joins keyed on shared column names
    Join {
        kind: JoinKind,
        left: Box<RaExpression>,
        right: Box<RaExpression>,
    },
    /// ⋈ with an explicit condition
    ThetaJoin {
        condition: BooleanExpression,
        left: Box<RaExpression>,
        right: Box<RaExpression>,
    },
    /// ÷
    Division {
        dividend: Box<RaExpression>,
        divisor: Box<RaExpression>,
    },
    /// Γ — grouping with aggregation outputs
    GroupedAggregation {
        group_by: Vec<Attribute>,
        aggregations: Vec<Aggregation>,
        input: Box<RaExpression>,
    },
    /// T — the n largest tuples by one attribute
    TopN {
        limit: u64,
        attribute: Attribute,
        input: Box<RaExpression>,
    },
}

impl PartialEq for RaExpression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl RaExpression {
    fn new(kind: RaKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    /// Attach a source span
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Base relation reference
    pub fn relation(name: impl Into<String>) -> Self {
        Self::new(RaKind::Relation { name: name.into() })
    }

    /// π over this expression
    pub fn project(self, attributes: Vec<Attribute>) -> Self {
        Self::new(RaKind::Projection {
            attributes,
            input: Box::new(self),
        })
    }

    /// σ over this expression
    pub fn select(self, condition: BooleanExpression) -> Self {
        Self::new(RaKind::Selection {
            condition,
            input: Box::new(self),
        })
    }

    /// ρ over this expression
    pub fn rename(self, alias: impl Into<String>) -> Self {
        Self::new(RaKind::Rename {
            alias: alias.into(),
            input: Box::new(self),
        })
    }

    fn set_op(self, kind: SetOpKind, other: RaExpression) -> Self {
        Self::new(RaKind::SetOperation {
            kind,
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    /// ∪
    pub fn union(self, other: RaExpression) -> Self {
        self.set_op(SetOpKind::Union, other)
    }

    /// ∩
    pub fn intersect(self, other: RaExpression) -> Self {
        self.set_op(SetOpKind::Intersect, other)
    }

    /// −
    pub fn difference(self, other: RaExpression) -> Self {
        self.set_op(SetOpKind::Difference, other)
    }

    /// ×
    pub fn cartesian(self, other: RaExpression) -> Self {
        self.set_op(SetOpKind::Cartesian, other)
    }

    fn join(self, kind: JoinKind, other: RaExpression) -> Self {
        Self::new(RaKind::Join {
            kind,
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    /// ⋈
    pub fn natural_join(self, other: RaExpression) -> Self {
        self.join(JoinKind::Natural, other)
    }

    /// ⋉
    pub fn semi_join(self, other: RaExpression) -> Self {
        self.join(JoinKind::Semi, other)
    }

    /// ▷
    pub fn anti_join(self, other: RaExpression) -> Self {
        self.join(JoinKind::Anti, other)
    }

    /// ⟕
    pub fn left_join(self, other: RaExpression) -> Self {
        self.join(JoinKind::Left, other)
    }

    /// ⟖
    pub fn right_join(self, other: RaExpression) -> Self {
        self.join(JoinKind::Right, other)
    }

    /// ⟗
    pub fn outer_join(self, other: RaExpression) -> Self {
        self.join(JoinKind::Outer, other)
    }

    /// ⋈ with an explicit condition
    pub fn theta_join(self, other: RaExpression, condition: BooleanExpression) -> Self {
        Self::new(RaKind::ThetaJoin {
            condition,
            left: Box::new(self),
            right: Box::new(other),
        })
    }

    /// ÷
    pub fn divide(self, divisor: RaExpression) -> Self {
        Self::new(RaKind::Division {
            dividend: Box::new(self),
            divisor: Box::new(divisor),
        })
    }

    /// Γ over this expression
    pub fn aggregate(self, group_by: Vec<Attribute>, aggregations: Vec<Aggregation>) -> Self {
        Self::new(RaKind::GroupedAggregation {
            group_by,
            aggregations,
            input: Box::new(self),
        })
    }

    /// T over this expression
    pub fn top_n(self, limit: u64, attribute: Attribute) -> Self {
        Self::new(RaKind::TopN {
            limit,
            attribute,
            input: Box::new(self),
        })
    }

    /// Child operands, left to right
    pub fn children(&self) -> Vec<&RaExpression> {
        match &self.kind {
            RaKind::Relation { .. } => vec![],
            RaKind::Projection { input, .. }
            | RaKind::Selection { input, .. }
            | RaKind::Rename { input, .. }
            | RaKind::GroupedAggregation { input, .. }
            | RaKind::TopN { input, .. } => vec![input],
            RaKind::SetOperation { left, right, .. }
            | RaKind::Join { left, right, .. }
            | RaKind::ThetaJoin { left, right, .. } => vec![left, right],
            RaKind::Division { dividend, divisor } => vec![dividend, divisor],
        }
    }

    /// Display name of this node's operator
    pub fn operator_name(&self) -> &'static str {
        match &self.kind {
            RaKind::Relation { .. } => "relation",
            RaKind::Projection { .. } => "projection",
            RaKind::Selection { .. } => "selection",
            RaKind::Rename { .. } => "rename",
            RaKind::SetOperation { kind, .. } => kind.name(),
            RaKind::Join { kind, .. } => kind.name(),
            RaKind::ThetaJoin { .. } => "theta join",
            RaKind::Division { .. } => "division",
            RaKind::GroupedAggregation { .. } => "grouped aggregation",
            RaKind::TopN { .. } => "top-n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinators_build_expected_shape() {
        let q = RaExpression::relation("R")
            .select(BooleanExpression::compare_literal(
                Attribute::new("a"),
                ComparisonOp::Gt,
                Literal::Integer(5),
            ))
            .project(vec![Attribute::new("a"), Attribute::new("b")]);

        match &q.kind {
            RaKind::Projection { attributes, input } => {
                assert_eq!(attributes.len(), 2);
                assert!(matches!(input.kind, RaKind::Selection { .. }));
            }
            other => panic!("expected projection, got {other:?}"),
        }
    }

    #[test]
    fn test_equality_ignores_position() {
        let a = RaExpression::relation("R");
        let b = RaExpression::relation("R").with_position(Position::new(1, 1, 2));
        assert_eq!(a, b);
        assert_ne!(a, RaExpression::relation("S"));
    }

    #[test]
    fn test_boolean_attribute_collection() {
        let cond = BooleanExpression::compare_attributes(
            Attribute::qualified("R", "a"),
            ComparisonOp::Eq,
            Attribute::qualified("S", "a"),
        )
        .and(BooleanExpression::compare_literal(
            Attribute::new("b"),
            ComparisonOp::Lt,
            Literal::Integer(3),
        ));
        let attrs = cond.attributes();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].relation.as_deref(), Some("R"));
        assert_eq!(attrs[2].name, "b");
    }

    #[test]
    fn test_map_attributes_rewrites_qualifiers() {
        let cond = BooleanExpression::compare_attributes(
            Attribute::qualified("R", "a"),
            ComparisonOp::Eq,
            Attribute::qualified("S", "a"),
        );
        let rewritten = cond.map_attributes(&|attr| {
            if attr.relation.as_deref() == Some("R") {
                Attribute::qualified("t1", attr.name.clone())
            } else {
                attr.clone()
            }
        });
        let attrs = rewritten.attributes();
        assert_eq!(attrs[0].relation.as_deref(), Some("t1"));
        assert_eq!(attrs[1].relation.as_deref(), Some("S"));
    }

    #[test]
    fn test_children() {
        let q = RaExpression::relation("R").divide(RaExpression::relation("S"));
        let kids = q.children();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].kind, RaKind::Relation { name: "R".into() });
    }
}
