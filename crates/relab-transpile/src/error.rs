//! Error types for transpilation

use relab_core::SemanticError;
use thiserror::Error;

/// Transpilation failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranspileError {
    /// The input does not validate against the schema
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// The query validates but has no counterpart in the target language's
    /// supported subset
    #[error("[T001] unsupported query shape: {construct}")]
    UnsupportedQuery { construct: String },
}

impl TranspileError {
    /// Shorthand used throughout the transpilers
    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        let construct = construct.into();
        log::debug!("query shape outside the transpilable subset: {construct}");
        TranspileError::UnsupportedQuery { construct }
    }
}

/// Result type alias for TranspileError
pub type TranspileResult<T> = Result<T, TranspileError>;
