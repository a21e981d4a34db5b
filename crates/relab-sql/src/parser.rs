//! SQL parser wrapper
//!
//! The actual parsing is the `sqlparser` crate's job; this wrapper pins the
//! dialect, normalizes its errors into `SqlError`, and narrows statements
//! to the queries the validator understands.

use crate::error::{SqlError, SqlResult};
use sqlparser::ast::{Query, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// SQL parser with a fixed generic dialect
#[derive(Debug, Default)]
pub struct SqlParser {
    dialect: GenericDialect,
}

impl SqlParser {
    /// Create a parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }
        Parser::parse_sql(&self.dialect, sql).map_err(|e| parse_error(&e.to_string()))
    }

    /// Parse SQL and return the first statement
    pub fn parse_single(&self, sql: &str) -> SqlResult<Statement> {
        let stmts = self.parse(sql)?;
        stmts.into_iter().next().ok_or(SqlError::EmptySql)
    }

    /// Parse SQL into a single query expression; non-SELECT statements are
    /// rejected
    pub fn parse_query(&self, sql: &str) -> SqlResult<Box<Query>> {
        match self.parse_single(sql)? {
            Statement::Query(query) => Ok(query),
            other => Err(SqlError::UnsupportedStatement(statement_kind(&other).to_string())),
        }
    }
}

/// Return a human-readable name for a statement variant
fn statement_kind(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::Query(_) => "SELECT",
        Statement::Insert(_) => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::Drop { .. } => "DROP",
        Statement::Truncate { .. } => "TRUNCATE",
        _ => "unsupported statement",
    }
}

/// Extract the line/column sqlparser embeds in its message, best effort
fn parse_error(message: &str) -> SqlError {
    let line = find_number_after(message, "Line: ").unwrap_or(1);
    let column = find_number_after(message, "Column: ")
        .or_else(|| find_number_after(message, "Column "))
        .unwrap_or(1);
    SqlError::ParseError {
        message: message.to_string(),
        line,
        column,
    }
}

fn find_number_after(message: &str, marker: &str) -> Option<u32> {
    let rest = &message[message.find(marker)? + marker.len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
