//! WHERE-clause normalization for SQL→RA flattening
//!
//! The flattener requires the WHERE clause to be one top-level conjunction
//! of subquery-free terms and (possibly negated) existence predicates.
//! `IN (subquery)`, `= ANY` and `<> ALL` normalize to the existence form
//! with an extra correlation hint; everything else containing a subquery
//! (notably OR-connected subquery predicates) is rejected.

use crate::error::{TranspileError, TranspileResult};
use sqlparser::ast::{BinaryOperator, Expr, Query};

/// One top-level WHERE conjunct, classified for the flattener
pub(crate) enum Predicate<'q> {
    /// Subquery-free term, kept for the trailing selection
    Plain(&'q Expr),
    /// `[NOT] EXISTS (query)`, possibly derived from IN/ANY/ALL
    Exists {
        query: &'q Query,
        negated: bool,
        /// Left-hand side of the IN/ANY/ALL this predicate was derived
        /// from; correlates with the subquery's first output column
        correlation_lhs: Option<&'q Expr>,
    },
}

/// Split an expression into its top-level AND conjuncts
pub(crate) fn split_conjuncts(expr: &Expr) -> Vec<&Expr> {
    let mut out = Vec::new();
    collect_conjuncts(expr, &mut out);
    out
}

fn collect_conjuncts<'q>(expr: &'q Expr, out: &mut Vec<&'q Expr>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            collect_conjuncts(left, out);
            collect_conjuncts(right, out);
        }
        Expr::Nested(inner) => collect_conjuncts(inner, out),
        other => out.push(other),
    }
}

/// Classify one conjunct
pub(crate) fn classify(conjunct: &Expr) -> TranspileResult<Predicate<'_>> {
    match conjunct {
        Expr::Exists { subquery, negated } => Ok(Predicate::Exists {
            query: subquery,
            negated: *negated,
            correlation_lhs: None,
        }),

        Expr::InSubquery {
            expr,
            subquery,
            negated,
        } => Ok(Predicate::Exists {
            query: subquery,
            negated: *negated,
            correlation_lhs: Some(expr),
        }),

        Expr::AnyOp {
            left,
            compare_op: BinaryOperator::Eq,
            right,
            ..
        } => match right.as_ref() {
            Expr::Subquery(subquery) => Ok(Predicate::Exists {
                query: subquery,
                negated: false,
                correlation_lhs: Some(left),
            }),
            _ => Err(TranspileError::unsupported("ANY without a subquery")),
        },

        Expr::AllOp {
            left,
            compare_op: BinaryOperator::NotEq,
            right,
            ..
        } => match right.as_ref() {
            Expr::Subquery(subquery) => Ok(Predicate::Exists {
                query: subquery,
                negated: true,
                correlation_lhs: Some(left),
            }),
            _ => Err(TranspileError::unsupported("ALL without a subquery")),
        },

        Expr::AnyOp { compare_op, .. } | Expr::AllOp { compare_op, .. } => Err(
            TranspileError::unsupported(format!("quantified comparison with {compare_op}")),
        ),

        other => {
            if contains_subquery(other) {
                // the flattening contract: subqueries only as top-level
                // conjuncts, never under OR/NOT or inside comparisons
                Err(TranspileError::unsupported(
                    "subquery outside a top-level conjunct",
                ))
            } else {
                Ok(Predicate::Plain(other))
            }
        }
    }
}

/// Whether any subquery occurs anywhere inside the expression
pub(crate) fn contains_subquery(expr: &Expr) -> bool {
    match expr {
        Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => true,
        Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
            contains_subquery(left) || contains_subquery(right)
        }
        Expr::BinaryOp { left, right, .. } => contains_subquery(left) || contains_subquery(right),
        Expr::UnaryOp { expr, .. } => contains_subquery(expr),
        Expr::Nested(inner) => contains_subquery(inner),
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => contains_subquery(inner),
        Expr::Between {
            expr, low, high, ..
        } => contains_subquery(expr) || contains_subquery(low) || contains_subquery(high),
        Expr::InList { expr, list, .. } => {
            contains_subquery(expr) || list.iter().any(contains_subquery)
        }
        Expr::Cast { expr, .. } => contains_subquery(expr),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn where_of(sql: &str) -> Expr {
        let stmts = Parser::parse_sql(&GenericDialect {}, sql).unwrap();
        let sqlparser::ast::Statement::Query(query) = &stmts[0] else {
            panic!("expected a query");
        };
        let sqlparser::ast::SetExpr::Select(select) = query.body.as_ref() else {
            panic!("expected a select");
        };
        select.selection.clone().expect("expected a WHERE clause")
    }

    #[test]
    fn test_split_conjuncts() {
        let expr = where_of("SELECT 1 FROM t WHERE a = 1 AND (b = 2 AND c = 3)");
        assert_eq!(split_conjuncts(&expr).len(), 3);
    }

    #[test]
    fn test_or_is_one_conjunct() {
        let expr = where_of("SELECT 1 FROM t WHERE a = 1 OR b = 2");
        assert_eq!(split_conjuncts(&expr).len(), 1);
    }

    #[test]
    fn test_classify_exists() {
        let expr = where_of("SELECT 1 FROM t WHERE EXISTS (SELECT 1 FROM s WHERE s.x = t.x)");
        assert!(matches!(
            classify(&expr),
            Ok(Predicate::Exists {
                negated: false,
                correlation_lhs: None,
                ..
            })
        ));
    }

    #[test]
    fn test_classify_in_subquery_as_exists() {
        let expr = where_of("SELECT 1 FROM t WHERE x NOT IN (SELECT x FROM s)");
        assert!(matches!(
            classify(&expr),
            Ok(Predicate::Exists {
                negated: true,
                correlation_lhs: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn test_classify_quantified() {
        let expr = where_of("SELECT 1 FROM t WHERE x = ANY (SELECT x FROM s)");
        assert!(matches!(
            classify(&expr),
            Ok(Predicate::Exists { negated: false, .. })
        ));
        let expr = where_of("SELECT 1 FROM t WHERE x <> ALL (SELECT x FROM s)");
        assert!(matches!(
            classify(&expr),
            Ok(Predicate::Exists { negated: true, .. })
        ));
        let expr = where_of("SELECT 1 FROM t WHERE x < ANY (SELECT x FROM s)");
        assert!(classify(&expr).is_err());
    }

    #[test]
    fn test_subquery_under_or_rejected() {
        let expr =
            where_of("SELECT 1 FROM t WHERE a = 1 OR EXISTS (SELECT 1 FROM s WHERE s.x = t.x)");
        assert!(matches!(
            classify(&expr),
            Err(TranspileError::UnsupportedQuery { .. })
        ));
    }

    #[test]
    fn test_plain_conjunct() {
        let expr = where_of("SELECT 1 FROM t WHERE a = 1");
        assert!(matches!(classify(&expr), Ok(Predicate::Plain(_))));
    }
}
