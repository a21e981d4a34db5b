//! relab-core: shared relational type system for the relab query compiler
//!
//! This crate provides the `DataType` lattice, the input `RelationalSchema`
//! catalog, the inferred `ResultSchema` with its three-way attribute
//! resolution contract, and the error model shared by the RA and SQL
//! validators.

pub mod error;
pub mod position;
pub mod result_schema;
pub mod schema;
pub mod types;

pub use error::{QueryError, SemanticError, SemanticResult};
pub use position::Position;
pub use result_schema::{Attribute, Resolution, ResolvedAttribute, ResultSchema, TypedAttribute};
pub use schema::{Column, RelationalSchema, TableSchema};
pub use types::DataType;
