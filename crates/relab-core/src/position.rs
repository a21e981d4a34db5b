//! Source positions for diagnostics

use serde::{Deserialize, Serialize};

/// A half-open source span on a single line, 1-based.
///
/// Positions are diagnostics metadata: AST equality deliberately ignores
/// them, so a parsed tree and a combinator-built tree compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number, starting at 1
    pub line: u32,
    /// First column of the construct, starting at 1
    pub start_col: u32,
    /// Column just past the construct
    pub end_col: u32,
}

impl Position {
    /// Create a position span
    pub fn new(line: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            line,
            start_col,
            end_col,
        }
    }

    /// Extend this span to cover `other` as well (same line: widen columns;
    /// otherwise keep the earlier line's start)
    pub fn merge(&self, other: &Position) -> Position {
        if self.line == other.line {
            Position {
                line: self.line,
                start_col: self.start_col.min(other.start_col),
                end_col: self.end_col.max(other.end_col),
            }
        } else if self.line < other.line {
            *self
        } else {
            *other
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.start_col)
    }
}
