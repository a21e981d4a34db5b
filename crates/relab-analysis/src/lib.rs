//! relab-analysis: schema inference and semantic validation for RA trees
//!
//! The `SchemaInferrer` computes the output schema of every operator per
//! the algebra's type rules, memoized by node identity within one call.
//! The validator walks a tree bottom-up and raises the first semantic
//! error; the tree builder instead re-validates every subtree
//! independently and records errors as data for the visualization client.

pub mod infer;
pub mod tree;
pub mod validator;

pub use infer::SchemaInferrer;
pub use tree::{build_tree, QueryTree, TreeNode, TreeNodeKind};
pub use validator::validate;
