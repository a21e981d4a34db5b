//! relab-sql: the SQL side of the query compiler
//!
//! SQL text is parsed by the external `sqlparser` crate; this crate wraps
//! it behind a thin parser type, validates the resulting AST against a
//! schema with a chain of scopes (supporting correlated subqueries), and
//! provides the small SQL writer AST that the RA→SQL transpiler emits.

pub mod error;
pub mod parser;
pub mod scope;
pub mod validator;
pub mod writer;

pub use error::{SqlError, SqlResult};
pub use parser::SqlParser;
pub use scope::{GroupByScope, ProjectionsScope, Scope, TablesScope};
pub use validator::{query_output_schema, validate_query};
pub use writer::{
    SqlExpr, SqlJoinKind, SqlLiteral, SqlOrderBy, SqlQuery, SqlSelect, SqlSelectItem, SqlSetOp,
    SqlTableRef,
};

// Callers hand us ASTs from this exact parser; re-export it so they need
// not depend on it directly.
pub use sqlparser;
