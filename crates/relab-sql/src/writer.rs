//! A small SQL query AST and its text renderer
//!
//! This is the output side of the system: the RA→SQL transpiler builds
//! these values and renders them compactly or clause-per-line. Input SQL
//! is a different representation entirely (the `sqlparser` AST).

use std::fmt;

/// A complete query expression
#[derive(Debug, Clone, PartialEq)]
pub enum SqlQuery {
    /// A single SELECT
    Select(SqlSelect),
    /// UNION / INTERSECT / EXCEPT of two queries
    SetOp {
        op: SqlSetOp,
        left: Box<SqlQuery>,
        right: Box<SqlQuery>,
    },
}

/// Set operator keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlSetOp {
    Union,
    Intersect,
    Except,
}

impl SqlSetOp {
    fn keyword(&self) -> &'static str {
        match self {
            SqlSetOp::Union => "UNION",
            SqlSetOp::Intersect => "INTERSECT",
            SqlSetOp::Except => "EXCEPT",
        }
    }
}

/// One SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SqlSelect {
    /// SELECT DISTINCT
    pub distinct: bool,
    /// Select list; empty renders as `*`
    pub items: Vec<SqlSelectItem>,
    /// FROM clause
    pub from: SqlTableRef,
    /// WHERE clause
    pub where_clause: Option<SqlExpr>,
    /// GROUP BY expressions
    pub group_by: Vec<SqlExpr>,
    /// ORDER BY keys
    pub order_by: Vec<SqlOrderBy>,
    /// LIMIT row count
    pub limit: Option<u64>,
}

impl SqlSelect {
    /// `SELECT * FROM <from>`
    pub fn star_from(from: SqlTableRef) -> Self {
        Self {
            distinct: false,
            items: Vec::new(),
            from,
            where_clause: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// AND another conjunct onto the WHERE clause
    pub fn add_condition(&mut self, condition: SqlExpr) {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
    }
}

/// One select-list item
#[derive(Debug, Clone, PartialEq)]
pub struct SqlSelectItem {
    pub expr: SqlExpr,
    pub alias: Option<String>,
}

impl SqlSelectItem {
    /// Bare expression item
    pub fn plain(expr: SqlExpr) -> Self {
        Self { expr, alias: None }
    }

    /// `expr AS alias`
    pub fn aliased(expr: SqlExpr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// A FROM-clause table reference
#[derive(Debug, Clone, PartialEq)]
pub enum SqlTableRef {
    /// Base table, optionally aliased
    Table {
        name: String,
        alias: Option<String>,
    },
    /// Aliased derived table
    Derived {
        query: Box<SqlQuery>,
        alias: String,
    },
    /// Join of two references
    Join {
        left: Box<SqlTableRef>,
        right: Box<SqlTableRef>,
        kind: SqlJoinKind,
    },
}

impl SqlTableRef {
    /// Plain base table
    pub fn table(name: impl Into<String>) -> Self {
        SqlTableRef::Table {
            name: name.into(),
            alias: None,
        }
    }

    /// Aliased base table
    pub fn aliased_table(name: impl Into<String>, alias: impl Into<String>) -> Self {
        SqlTableRef::Table {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Derived table
    pub fn derived(query: SqlQuery, alias: impl Into<String>) -> Self {
        SqlTableRef::Derived {
            query: Box::new(query),
            alias: alias.into(),
        }
    }

    /// Join with another reference
    pub fn join(self, kind: SqlJoinKind, right: SqlTableRef) -> Self {
        SqlTableRef::Join {
            left: Box::new(self),
            right: Box::new(right),
            kind,
        }
    }
}

/// Join keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlJoinKind {
    Cross,
    Natural,
    NaturalLeft,
    NaturalRight,
    NaturalFull,
}

impl SqlJoinKind {
    fn keyword(&self) -> &'static str {
        match self {
            SqlJoinKind::Cross => "CROSS JOIN",
            SqlJoinKind::Natural => "NATURAL JOIN",
            SqlJoinKind::NaturalLeft => "NATURAL LEFT JOIN",
            SqlJoinKind::NaturalRight => "NATURAL RIGHT JOIN",
            SqlJoinKind::NaturalFull => "NATURAL FULL JOIN",
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum SqlLiteral {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

/// Scalar and boolean expressions
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    /// Column reference, optionally qualified
    Column {
        table: Option<String>,
        name: String,
    },
    /// Literal value
    Literal(SqlLiteral),
    /// Comparison, e.g. `a = b`
    Compare {
        op: &'static str,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    /// Conjunction
    And(Box<SqlExpr>, Box<SqlExpr>),
    /// Disjunction
    Or(Box<SqlExpr>, Box<SqlExpr>),
    /// Negation
    Not(Box<SqlExpr>),
    /// `[NOT] EXISTS (subquery)`
    Exists {
        query: Box<SqlQuery>,
        negated: bool,
    },
    /// Aggregate call
    Function {
        name: &'static str,
        arg: Box<SqlExpr>,
    },
}

impl SqlExpr {
    /// Unqualified column
    pub fn column(name: impl Into<String>) -> Self {
        SqlExpr::Column {
            table: None,
            name: name.into(),
        }
    }

    /// Qualified column
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        SqlExpr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// `self AND other`
    pub fn and(self, other: SqlExpr) -> Self {
        SqlExpr::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: SqlExpr) -> Self {
        SqlExpr::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`
    pub fn negate(self) -> Self {
        SqlExpr::Not(Box::new(self))
    }

    /// `left = right` over columns, the join-correlation workhorse
    pub fn eq(left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::Compare {
            op: "=",
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq)]
pub struct SqlOrderBy {
    pub expr: SqlExpr,
    pub descending: bool,
}

// ---- rendering ------------------------------------------------------------

impl SqlQuery {
    /// Render on one line
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, false, 0);
        out
    }

    /// Render clause-per-line with indented subqueries
    pub fn to_sql_pretty(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, true, 0);
        out
    }

    fn render(&self, out: &mut String, pretty: bool, depth: usize) {
        match self {
            SqlQuery::Select(select) => select.render(out, pretty, depth),
            SqlQuery::SetOp { op, left, right } => {
                // sides are parenthesized: SQL set operators do not all
                // share one precedence
                out.push('(');
                left.render(out, pretty, depth);
                out.push(')');
                separator(out, pretty, depth);
                out.push_str(op.keyword());
                separator(out, pretty, depth);
                out.push('(');
                right.render(out, pretty, depth);
                out.push(')');
            }
        }
    }
}

fn separator(out: &mut String, pretty: bool, depth: usize) {
    if pretty {
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    } else {
        out.push(' ');
    }
}

impl SqlSelect {
    fn render(&self, out: &mut String, pretty: bool, depth: usize) {
        out.push_str(if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        if self.items.is_empty() {
            out.push('*');
        } else {
            for (i, item) in self.items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                item.expr.render(out, pretty, depth);
                if let Some(alias) = &item.alias {
                    out.push_str(" AS ");
                    out.push_str(alias);
                }
            }
        }

        separator(out, pretty, depth);
        out.push_str("FROM ");
        self.from.render(out, pretty, depth);

        if let Some(where_clause) = &self.where_clause {
            separator(out, pretty, depth);
            out.push_str("WHERE ");
            where_clause.render(out, pretty, depth);
        }

        if !self.group_by.is_empty() {
            separator(out, pretty, depth);
            out.push_str("GROUP BY ");
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                expr.render(out, pretty, depth);
            }
        }

        if !self.order_by.is_empty() {
            separator(out, pretty, depth);
            out.push_str("ORDER BY ");
            for (i, key) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                key.expr.render(out, pretty, depth);
                out.push_str(if key.descending { " DESC" } else { " ASC" });
            }
        }

        if let Some(limit) = self.limit {
            separator(out, pretty, depth);
            out.push_str("LIMIT ");
            out.push_str(&limit.to_string());
        }
    }
}

impl SqlTableRef {
    fn render(&self, out: &mut String, pretty: bool, depth: usize) {
        match self {
            SqlTableRef::Table { name, alias } => {
                out.push_str(name);
                if let Some(alias) = alias {
                    out.push_str(" AS ");
                    out.push_str(alias);
                }
            }
            SqlTableRef::Derived { query, alias } => {
                out.push('(');
                query.render(out, pretty, depth + 1);
                out.push_str(") AS ");
                out.push_str(alias);
            }
            SqlTableRef::Join { left, right, kind } => {
                left.render(out, pretty, depth);
                out.push(' ');
                out.push_str(kind.keyword());
                out.push(' ');
                right.render(out, pretty, depth);
            }
        }
    }
}

impl SqlExpr {
    fn render(&self, out: &mut String, pretty: bool, depth: usize) {
        match self {
            SqlExpr::Column { table, name } => {
                if let Some(table) = table {
                    out.push_str(table);
                    out.push('.');
                }
                out.push_str(name);
            }
            SqlExpr::Literal(lit) => lit.render(out),
            SqlExpr::Compare { op, left, right } => {
                left.render(out, pretty, depth);
                out.push(' ');
                out.push_str(op);
                out.push(' ');
                right.render(out, pretty, depth);
            }
            SqlExpr::And(left, right) => {
                render_and_operand(left, out, pretty, depth);
                out.push_str(" AND ");
                render_and_operand(right, out, pretty, depth);
            }
            SqlExpr::Or(left, right) => {
                left.render(out, pretty, depth);
                out.push_str(" OR ");
                right.render(out, pretty, depth);
            }
            SqlExpr::Not(inner) => {
                out.push_str("NOT ");
                let needs_parens = matches!(**inner, SqlExpr::And(..) | SqlExpr::Or(..));
                if needs_parens {
                    out.push('(');
                }
                inner.render(out, pretty, depth);
                if needs_parens {
                    out.push(')');
                }
            }
            SqlExpr::Exists { query, negated } => {
                if *negated {
                    out.push_str("NOT ");
                }
                out.push_str("EXISTS (");
                query.render(out, pretty, depth + 1);
                out.push(')');
            }
            SqlExpr::Function { name, arg } => {
                out.push_str(name);
                out.push('(');
                arg.render(out, pretty, depth);
                out.push(')');
            }
        }
    }
}

/// Parenthesize OR under AND
fn render_and_operand(expr: &SqlExpr, out: &mut String, pretty: bool, depth: usize) {
    let needs_parens = matches!(expr, SqlExpr::Or(..));
    if needs_parens {
        out.push('(');
    }
    expr.render(out, pretty, depth);
    if needs_parens {
        out.push(')');
    }
}

impl SqlLiteral {
    fn render(&self, out: &mut String) {
        match self {
            SqlLiteral::String(s) => {
                out.push('\'');
                out.push_str(&s.replace('\'', "''"));
                out.push('\'');
            }
            SqlLiteral::Integer(n) => out.push_str(&n.to_string()),
            SqlLiteral::Float(x) => out.push_str(&format!("{x:?}")),
            SqlLiteral::Boolean(b) => out.push_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_select() {
        let q = SqlQuery::Select(SqlSelect::star_from(SqlTableRef::table("products")));
        assert_eq!(q.to_sql(), "SELECT * FROM products");
    }

    #[test]
    fn test_items_where_group_order_limit() {
        let mut select = SqlSelect::star_from(SqlTableRef::table("orders"));
        select.items = vec![
            SqlSelectItem::plain(SqlExpr::column("product_id")),
            SqlSelectItem::aliased(
                SqlExpr::Function {
                    name: "SUM",
                    arg: Box::new(SqlExpr::column("quantity")),
                },
                "total",
            ),
        ];
        select.add_condition(SqlExpr::Compare {
            op: ">",
            left: Box::new(SqlExpr::column("quantity")),
            right: Box::new(SqlExpr::Literal(SqlLiteral::Integer(0))),
        });
        select.group_by = vec![SqlExpr::column("product_id")];
        select.order_by = vec![SqlOrderBy {
            expr: SqlExpr::column("total"),
            descending: true,
        }];
        select.limit = Some(10);
        assert_eq!(
            SqlQuery::Select(select).to_sql(),
            "SELECT product_id, SUM(quantity) AS total FROM orders WHERE quantity > 0 \
             GROUP BY product_id ORDER BY total DESC LIMIT 10"
        );
    }

    #[test]
    fn test_add_condition_conjoins() {
        let mut select = SqlSelect::star_from(SqlTableRef::table("t"));
        select.add_condition(SqlExpr::eq(SqlExpr::column("a"), SqlExpr::column("b")));
        select.add_condition(SqlExpr::eq(SqlExpr::column("c"), SqlExpr::column("d")));
        assert_eq!(
            SqlQuery::Select(select).to_sql(),
            "SELECT * FROM t WHERE a = b AND c = d"
        );
    }

    #[test]
    fn test_or_parenthesized_under_and() {
        let cond = SqlExpr::eq(SqlExpr::column("a"), SqlExpr::column("b"))
            .or(SqlExpr::eq(SqlExpr::column("c"), SqlExpr::column("d")))
            .and(SqlExpr::eq(SqlExpr::column("e"), SqlExpr::column("f")));
        let mut select = SqlSelect::star_from(SqlTableRef::table("t"));
        select.add_condition(cond);
        assert_eq!(
            SqlQuery::Select(select).to_sql(),
            "SELECT * FROM t WHERE (a = b OR c = d) AND e = f"
        );
    }

    #[test]
    fn test_joins_and_derived_tables() {
        let from = SqlTableRef::table("R")
            .join(SqlJoinKind::Natural, SqlTableRef::table("S"))
            .join(
                SqlJoinKind::Cross,
                SqlTableRef::derived(
                    SqlQuery::Select(SqlSelect::star_from(SqlTableRef::table("T"))),
                    "t1",
                ),
            );
        let q = SqlQuery::Select(SqlSelect::star_from(from));
        assert_eq!(
            q.to_sql(),
            "SELECT * FROM R NATURAL JOIN S CROSS JOIN (SELECT * FROM T) AS t1"
        );
    }

    #[test]
    fn test_exists_and_set_op() {
        let mut outer = SqlSelect::star_from(SqlTableRef::table("products"));
        let mut inner = SqlSelect::star_from(SqlTableRef::table("orders"));
        inner.add_condition(SqlExpr::eq(
            SqlExpr::qualified("orders", "product_id"),
            SqlExpr::qualified("products", "product_id"),
        ));
        outer.add_condition(SqlExpr::Exists {
            query: Box::new(SqlQuery::Select(inner)),
            negated: false,
        });
        let union = SqlQuery::SetOp {
            op: SqlSetOp::Union,
            left: Box::new(SqlQuery::Select(outer)),
            right: Box::new(SqlQuery::Select(SqlSelect::star_from(SqlTableRef::table(
                "archive",
            )))),
        };
        assert_eq!(
            union.to_sql(),
            "(SELECT * FROM products WHERE EXISTS (SELECT * FROM orders \
             WHERE orders.product_id = products.product_id)) UNION (SELECT * FROM archive)"
        );
    }

    #[test]
    fn test_pretty_renders_clause_per_line() {
        let mut select = SqlSelect::star_from(SqlTableRef::table("products"));
        select.add_condition(SqlExpr::eq(
            SqlExpr::column("price"),
            SqlExpr::Literal(SqlLiteral::Integer(1)),
        ));
        let text = SqlQuery::Select(select).to_sql_pretty();
        assert_eq!(text, "SELECT *\nFROM products\nWHERE price = 1");
    }

    #[test]
    fn test_string_literal_escaping() {
        let mut select = SqlSelect::star_from(SqlTableRef::table("t"));
        select.add_condition(SqlExpr::Compare {
            op: "=",
            left: Box::new(SqlExpr::column("name")),
            right: Box::new(SqlExpr::Literal(SqlLiteral::String("O'Brien".into()))),
        });
        assert_eq!(
            SqlQuery::Select(select).to_sql(),
            "SELECT * FROM t WHERE name = 'O''Brien'"
        );
    }
}
