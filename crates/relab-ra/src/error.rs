//! Syntax error taxonomy for the RA parser

use relab_core::{Position, QueryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of RA syntax error kinds.
///
/// Each parser production raises its own kind at the failure point;
/// `UnexpectedToken`/`UnexpectedEndOfInput` are the generic fallbacks for
/// failures no specific production claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntaxErrorKind {
    MismatchedParenthesis,
    MissingComma,
    MissingOperand,
    InvalidOperator,
    MissingProjectionAttributes,
    MissingSelectionCondition,
    InvalidSelectionCondition,
    MissingThetaJoinCondition,
    InvalidThetaJoinCondition,
    MissingGroupingAggregations,
    InvalidAggregationInput,
    InvalidAggregationFunction,
    InvalidAggregationOutput,
    InvalidTopNLimit,
    InvalidTopNOrderBy,
    MissingRenameAlias,
    UnexpectedToken,
    UnexpectedEndOfInput,
}

impl SyntaxErrorKind {
    /// Short rule name for the user-facing report
    pub fn title(&self) -> &'static str {
        match self {
            SyntaxErrorKind::MismatchedParenthesis => "Mismatched parenthesis",
            SyntaxErrorKind::MissingComma => "Missing comma",
            SyntaxErrorKind::MissingOperand => "Missing operand",
            SyntaxErrorKind::InvalidOperator => "Invalid operator",
            SyntaxErrorKind::MissingProjectionAttributes => "Missing projection attributes",
            SyntaxErrorKind::MissingSelectionCondition => "Missing selection condition",
            SyntaxErrorKind::InvalidSelectionCondition => "Invalid selection condition",
            SyntaxErrorKind::MissingThetaJoinCondition => "Missing theta join condition",
            SyntaxErrorKind::InvalidThetaJoinCondition => "Invalid theta join condition",
            SyntaxErrorKind::MissingGroupingAggregations => "Missing grouping aggregations",
            SyntaxErrorKind::InvalidAggregationInput => "Invalid aggregation input",
            SyntaxErrorKind::InvalidAggregationFunction => "Invalid aggregation function",
            SyntaxErrorKind::InvalidAggregationOutput => "Invalid aggregation output",
            SyntaxErrorKind::InvalidTopNLimit => "Invalid top-n limit",
            SyntaxErrorKind::InvalidTopNOrderBy => "Invalid top-n order attribute",
            SyntaxErrorKind::MissingRenameAlias => "Missing rename alias",
            SyntaxErrorKind::UnexpectedToken => "Unexpected token",
            SyntaxErrorKind::UnexpectedEndOfInput => "Unexpected end of input",
        }
    }
}

/// A positioned RA syntax error with a source-context snippet
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{} at line {line}, column {column}: {snippet}", kind.title())]
pub struct SyntaxError {
    /// Diagnosed kind
    pub kind: SyntaxErrorKind,
    /// 1-based line of the failure
    pub line: u32,
    /// 1-based column of the failure
    pub column: u32,
    /// The offending source line (or its relevant window)
    pub snippet: String,
}

impl SyntaxError {
    /// Create a syntax error
    pub fn new(kind: SyntaxErrorKind, line: u32, column: u32, snippet: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column,
            snippet: snippet.into(),
        }
    }

    /// Replace the kind, keeping the location (used when an enclosing
    /// production diagnoses a more specific kind than the inner failure)
    pub fn with_kind(mut self, kind: SyntaxErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Render as the user-facing report shape
    pub fn to_query_error(&self) -> QueryError {
        QueryError {
            title: self.kind.title().to_string(),
            description: Some(format!("near '{}'", self.snippet)),
            hint: None,
            position: Some(Position::new(self.line, self.column, self.column + 1)),
        }
    }
}

impl From<SyntaxError> for QueryError {
    fn from(err: SyntaxError) -> Self {
        err.to_query_error()
    }
}

/// Result type alias for SyntaxError
pub type SyntaxResult<T> = Result<T, SyntaxError>;
