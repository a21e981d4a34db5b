//! relab-transpile: equivalence-preserving translation between the two
//! query languages
//!
//! RA→SQL is structural, one case per operator; SQL→RA additionally
//! flattens correlated `EXISTS`/`NOT EXISTS` subqueries (and the `IN`/
//! `ANY`/`ALL` forms that normalize to them) into the algebra's semi and
//! anti joins.

pub mod error;
pub mod normalize;
pub mod ra_to_sql;
pub mod sql_to_ra;

pub use error::{TranspileError, TranspileResult};
pub use ra_to_sql::ra_to_sql;
pub use sql_to_ra::sql_to_ra;
