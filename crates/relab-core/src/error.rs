//! Semantic error taxonomy and the user-facing error report shape

use crate::position::Position;
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing error report, the wire shape shared by both query languages.
///
/// `title` names the rule that was violated; `description` explains the
/// concrete violation; `hint` suggests a fix where one is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    /// Short rule name, e.g. "Ambiguous attribute reference"
    pub title: String,
    /// Concrete explanation of the violation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Suggested fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Source span, when the construct carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Semantic rule violations, shared by the RA and SQL validators.
///
/// A closed set: every input the grammars cover maps to one of these.
/// `NotImplemented` marks constructs outside the teaching subset — an
/// internal fault for the current call, never a semantic explanation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// Referenced relation is not in the schema
    #[error("relation '{name}' does not exist in the schema")]
    RelationNotFound {
        name: String,
        position: Option<Position>,
    },

    /// Attribute reference resolved to zero output columns
    #[error("attribute '{name}' cannot be resolved")]
    AttributeNotFound {
        name: String,
        position: Option<Position>,
    },

    /// Unqualified attribute reference resolved to more than one column
    #[error("attribute '{name}' is ambiguous; it is provided by {}", relations.join(", "))]
    AmbiguousAttributeReference {
        name: String,
        relations: Vec<String>,
        position: Option<Position>,
    },

    /// Comparison or boolean connective over incomparable types
    #[error("cannot compare {left} with {right}")]
    TypeMismatch {
        left: DataType,
        right: DataType,
        position: Option<Position>,
    },

    /// Set-operation operands differ in arity or positional type
    #[error("set operation operands are not union-compatible: {detail}")]
    UnionCompatibility {
        detail: String,
        position: Option<Position>,
    },

    /// Shared join column typed incompatibly on the two sides
    #[error("join attribute '{attribute}' has incomparable types {left} and {right}")]
    JoinAttributeTypeMismatch {
        attribute: String,
        left: DataType,
        right: DataType,
        position: Option<Position>,
    },

    /// Divisor column set is not a subset of the dividend's
    #[error("division requires every divisor attribute in the dividend; '{attribute}' is missing")]
    DivisionSchemaCompatibility {
        attribute: String,
        position: Option<Position>,
    },

    /// Shared division column typed incompatibly
    #[error("division attribute '{attribute}' has incomparable types {left} and {right}")]
    DivisionAttributeTypeMismatch {
        attribute: String,
        left: DataType,
        right: DataType,
        position: Option<Position>,
    },

    /// Aggregation function applied to an incompatible input type
    #[error("{function} cannot be applied to '{attribute}' of type {data_type}")]
    InvalidFunctionArgument {
        function: String,
        attribute: String,
        data_type: DataType,
        position: Option<Position>,
    },

    /// The same alias introduced twice in one scope
    #[error("alias '{alias}' is used more than once")]
    DuplicateAlias {
        alias: String,
        position: Option<Position>,
    },

    /// JOIN without ON/USING/NATURAL
    #[error("join is missing a join condition")]
    MissingJoinCondition { position: Option<Position> },

    /// Derived table (subquery in FROM) without an alias
    #[error("derived table requires an alias")]
    MissingDerivedTableAlias { position: Option<Position> },

    /// Computed derived-table column without an alias
    #[error("derived table column '{expression}' requires an alias")]
    MissingDerivedColumnAlias {
        expression: String,
        position: Option<Position>,
    },

    /// Column used outside GROUP BY and outside an aggregate in a grouped query
    #[error("column '{column}' must appear in GROUP BY or inside an aggregate function")]
    UngroupedColumn {
        column: String,
        position: Option<Position>,
    },

    /// Aggregate function in WHERE
    #[error("aggregate function {function} is not allowed in WHERE")]
    AggregateInWhere {
        function: String,
        position: Option<Position>,
    },

    /// Aggregate function nested inside another aggregate
    #[error("aggregate function {function} cannot be nested inside another aggregate")]
    NestedAggregate {
        function: String,
        position: Option<Position>,
    },

    /// ORDER BY ordinal outside 1..=N
    #[error("ORDER BY position {index} is not in the select list (1..={max})")]
    OrderByPosition {
        index: u64,
        max: usize,
        position: Option<Position>,
    },

    /// Non-aggregate ORDER BY expression absent from the select list of a grouped query
    #[error("ORDER BY expression '{expression}' does not appear in the select list")]
    OrderByExpressionNotInSelectList {
        expression: String,
        position: Option<Position>,
    },

    /// Set-operation sides select different column counts
    #[error("set operation sides select {left} and {right} columns")]
    ColumnCountMismatch {
        left: usize,
        right: usize,
        position: Option<Position>,
    },

    /// Set-operation sides disagree on a positional column type
    #[error("set operation column {index} has incomparable types {left} and {right}")]
    ColumnTypeMismatch {
        index: usize,
        left: DataType,
        right: DataType,
        position: Option<Position>,
    },

    /// Subquery used as a scalar must yield one aggregate-backed column
    #[error("scalar subquery expected: {detail}")]
    ScalarSubqueryExpected {
        detail: String,
        position: Option<Position>,
    },

    /// CAST between types absent from the cast-compatibility table
    #[error("cannot cast {from} to {to}")]
    InvalidCast {
        from: DataType,
        to: DataType,
        position: Option<Position>,
    },

    /// Construct outside the teaching subset; fatal to the call, not a
    /// semantic explanation
    #[error("not implemented: {construct}")]
    NotImplemented { construct: String },
}

impl SemanticError {
    /// Short rule name for the user-facing report
    pub fn title(&self) -> &'static str {
        match self {
            SemanticError::RelationNotFound { .. } => "Relation not found",
            SemanticError::AttributeNotFound { .. } => "Attribute not found",
            SemanticError::AmbiguousAttributeReference { .. } => "Ambiguous attribute reference",
            SemanticError::TypeMismatch { .. } => "Type mismatch",
            SemanticError::UnionCompatibility { .. } => "Union-incompatible operands",
            SemanticError::JoinAttributeTypeMismatch { .. } => "Join attribute type mismatch",
            SemanticError::DivisionSchemaCompatibility { .. } => "Division schema mismatch",
            SemanticError::DivisionAttributeTypeMismatch { .. } => "Division attribute type mismatch",
            SemanticError::InvalidFunctionArgument { .. } => "Invalid function argument",
            SemanticError::DuplicateAlias { .. } => "Duplicate alias",
            SemanticError::MissingJoinCondition { .. } => "Missing join condition",
            SemanticError::MissingDerivedTableAlias { .. } => "Missing derived table alias",
            SemanticError::MissingDerivedColumnAlias { .. } => "Missing derived column alias",
            SemanticError::UngroupedColumn { .. } => "Ungrouped column",
            SemanticError::AggregateInWhere { .. } => "Aggregate in WHERE",
            SemanticError::NestedAggregate { .. } => "Nested aggregate",
            SemanticError::OrderByPosition { .. } => "Invalid ORDER BY position",
            SemanticError::OrderByExpressionNotInSelectList { .. } => {
                "ORDER BY expression not in select list"
            }
            SemanticError::ColumnCountMismatch { .. } => "Column count mismatch",
            SemanticError::ColumnTypeMismatch { .. } => "Column type mismatch",
            SemanticError::ScalarSubqueryExpected { .. } => "Scalar subquery expected",
            SemanticError::InvalidCast { .. } => "Invalid cast",
            SemanticError::NotImplemented { .. } => "Not implemented",
        }
    }

    /// Suggested fix, where one is known
    pub fn hint(&self) -> Option<String> {
        match self {
            SemanticError::AmbiguousAttributeReference { name, relations, .. } => Some(format!(
                "qualify the attribute, e.g. {}.{name}",
                relations.first().map(String::as_str).unwrap_or("relation")
            )),
            SemanticError::UngroupedColumn { column, .. } => Some(format!(
                "add '{column}' to GROUP BY or wrap it in an aggregate function"
            )),
            SemanticError::AggregateInWhere { .. } => {
                Some("move the aggregate condition to a HAVING clause".to_string())
            }
            SemanticError::MissingDerivedTableAlias { .. } => {
                Some("append 'AS name' to the subquery".to_string())
            }
            SemanticError::MissingJoinCondition { .. } => {
                Some("add an ON or USING clause, or use CROSS JOIN".to_string())
            }
            _ => None,
        }
    }

    /// Source span of the offending construct, when known
    pub fn position(&self) -> Option<Position> {
        match self {
            SemanticError::RelationNotFound { position, .. }
            | SemanticError::AttributeNotFound { position, .. }
            | SemanticError::AmbiguousAttributeReference { position, .. }
            | SemanticError::TypeMismatch { position, .. }
            | SemanticError::UnionCompatibility { position, .. }
            | SemanticError::JoinAttributeTypeMismatch { position, .. }
            | SemanticError::DivisionSchemaCompatibility { position, .. }
            | SemanticError::DivisionAttributeTypeMismatch { position, .. }
            | SemanticError::InvalidFunctionArgument { position, .. }
            | SemanticError::DuplicateAlias { position, .. }
            | SemanticError::MissingJoinCondition { position }
            | SemanticError::MissingDerivedTableAlias { position }
            | SemanticError::MissingDerivedColumnAlias { position, .. }
            | SemanticError::UngroupedColumn { position, .. }
            | SemanticError::AggregateInWhere { position, .. }
            | SemanticError::NestedAggregate { position, .. }
            | SemanticError::OrderByPosition { position, .. }
            | SemanticError::OrderByExpressionNotInSelectList { position, .. }
            | SemanticError::ColumnCountMismatch { position, .. }
            | SemanticError::ColumnTypeMismatch { position, .. }
            | SemanticError::ScalarSubqueryExpected { position, .. }
            | SemanticError::InvalidCast { position, .. } => *position,
            SemanticError::NotImplemented { .. } => None,
        }
    }

    /// Render as the user-facing report shape
    pub fn to_query_error(&self) -> QueryError {
        QueryError {
            title: self.title().to_string(),
            description: Some(self.to_string()),
            hint: self.hint(),
            position: self.position(),
        }
    }
}

impl From<SemanticError> for QueryError {
    fn from(err: SemanticError) -> Self {
        err.to_query_error()
    }
}

/// Result type alias for SemanticError
pub type SemanticResult<T> = Result<T, SemanticError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_shape() {
        let err = SemanticError::AmbiguousAttributeReference {
            name: "id".to_string(),
            relations: vec!["orders".to_string(), "customers".to_string()],
            position: Some(Position::new(1, 5, 7)),
        };
        let qe = err.to_query_error();
        assert_eq!(qe.title, "Ambiguous attribute reference");
        assert!(qe.description.unwrap().contains("orders, customers"));
        assert_eq!(qe.hint.unwrap(), "qualify the attribute, e.g. orders.id");
        assert_eq!(qe.position.unwrap().start_col, 5);
    }

    #[test]
    fn test_not_implemented_has_no_position() {
        let err = SemanticError::NotImplemented {
            construct: "window functions".to_string(),
        };
        assert_eq!(err.position(), None);
        assert_eq!(err.title(), "Not implemented");
    }
}
