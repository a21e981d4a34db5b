//! RA→SQL compilation — one case per operator
//!
//! Operands that are not bare relations are wrapped in derived-table
//! subqueries with synthetic aliases (`t1`, `t2`, ...), and attribute
//! references in sibling conditions are redirected from the wrapped
//! relation names to the alias before emission.

use crate::error::{TranspileError, TranspileResult};
use relab_analysis::{validate, SchemaInferrer};
use relab_core::{Attribute, RelationalSchema, ResultSchema};
use relab_ra::{
    BoolKind, BooleanExpression, ComparisonOp, JoinKind, Literal, Operand, RaExpression, RaKind,
    SetOpKind,
};
use relab_sql::{
    SqlExpr, SqlJoinKind, SqlLiteral, SqlOrderBy, SqlQuery, SqlSelect, SqlSelectItem, SqlSetOp,
    SqlTableRef,
};

/// Compile a validated RA expression into a SQL query expression
pub fn ra_to_sql(expr: &RaExpression, schema: &RelationalSchema) -> TranspileResult<SqlQuery> {
    validate(expr, schema)?;
    let mut compiler = Compiler {
        inferrer: SchemaInferrer::new(schema),
        next_alias: 0,
    };
    compiler.compile(expr)
}

struct Compiler<'a> {
    inferrer: SchemaInferrer<'a>,
    next_alias: u32,
}

impl<'a> Compiler<'a> {
    fn fresh_alias(&mut self) -> String {
        self.next_alias += 1;
        format!("t{}", self.next_alias)
    }

    fn compile(&mut self, expr: &'a RaExpression) -> TranspileResult<SqlQuery> {
        match &expr.kind {
            RaKind::Relation { name } => Ok(SqlQuery::Select(SqlSelect::star_from(
                SqlTableRef::table(name.clone()),
            ))),

            RaKind::Projection { attributes, input } => {
                let (mut select, rewrite) = self.absorbing_select(input)?;
                // RA projection is the only naming operator: it replaces the
                // select list outright
                select.items = attributes
                    .iter()
                    .map(|attr| SqlSelectItem::plain(column_expr(&rewrite.apply(attr))))
                    .collect();
                Ok(SqlQuery::Select(select))
            }

            RaKind::Selection { condition, input } => {
                let (mut select, rewrite) = self.absorbing_select(input)?;
                let condition = condition.map_attributes(&|attr| rewrite.apply(attr));
                select.add_condition(convert_condition(&condition));
                Ok(SqlQuery::Select(select))
            }

            RaKind::Rename { alias, input } => {
                let table_ref = match &input.kind {
                    RaKind::Relation { name } => {
                        SqlTableRef::aliased_table(name.clone(), alias.clone())
                    }
                    _ => SqlTableRef::derived(self.compile(input)?, alias.clone()),
                };
                Ok(SqlQuery::Select(SqlSelect::star_from(table_ref)))
            }

            RaKind::SetOperation { kind, left, right } => match kind {
                SetOpKind::Union | SetOpKind::Intersect | SetOpKind::Difference => {
                    let op = match kind {
                        SetOpKind::Union => SqlSetOp::Union,
                        SetOpKind::Intersect => SqlSetOp::Intersect,
                        _ => SqlSetOp::Except,
                    };
                    Ok(SqlQuery::SetOp {
                        op,
                        left: Box::new(self.compile(left)?),
                        right: Box::new(self.compile(right)?),
                    })
                }
                SetOpKind::Cartesian => {
                    let (left_ref, _, _) = self.table_ref(left)?;
                    let (right_ref, _, _) = self.table_ref(right)?;
                    Ok(SqlQuery::Select(SqlSelect::star_from(
                        left_ref.join(SqlJoinKind::Cross, right_ref),
                    )))
                }
            },

            RaKind::Join { kind, left, right } => match kind {
                JoinKind::Natural | JoinKind::Left | JoinKind::Right | JoinKind::Outer => {
                    let sql_kind = match kind {
                        JoinKind::Natural => SqlJoinKind::Natural,
                        JoinKind::Left => SqlJoinKind::NaturalLeft,
                        JoinKind::Right => SqlJoinKind::NaturalRight,
                        _ => SqlJoinKind::NaturalFull,
                    };
                    let (left_ref, _, _) = self.table_ref(left)?;
                    let (right_ref, _, _) = self.table_ref(right)?;
                    Ok(SqlQuery::Select(SqlSelect::star_from(
                        left_ref.join(sql_kind, right_ref),
                    )))
                }
                JoinKind::Semi => self.compile_semi_anti(left, right, false),
                JoinKind::Anti => self.compile_semi_anti(left, right, true),
            },

            RaKind::ThetaJoin {
                condition,
                left,
                right,
            } => {
                let (left_ref, _, left_rewrite) = self.table_ref(left)?;
                let (right_ref, _, right_rewrite) = self.table_ref(right)?;
                let condition = condition
                    .map_attributes(&|attr| right_rewrite.apply(&left_rewrite.apply(attr)));
                let mut select =
                    SqlSelect::star_from(left_ref.join(SqlJoinKind::Cross, right_ref));
                select.add_condition(convert_condition(&condition));
                Ok(SqlQuery::Select(select))
            }

            RaKind::Division { dividend, divisor } => self.compile_division(expr, dividend, divisor),

            RaKind::GroupedAggregation {
                group_by,
                aggregations,
                input,
            } => {
                let (mut select, rewrite) = self.absorbing_select(input)?;
                let mut items = Vec::new();
                let mut group_exprs = Vec::new();
                for attr in group_by {
                    let expr = column_expr(&rewrite.apply(attr));
                    items.push(SqlSelectItem::plain(expr.clone()));
                    group_exprs.push(expr);
                }
                for agg in aggregations {
                    items.push(SqlSelectItem::aliased(
                        SqlExpr::Function {
                            name: agg.function.sql_name(),
                            arg: Box::new(column_expr(&rewrite.apply(&agg.input))),
                        },
                        agg.output.clone(),
                    ));
                }
                select.items = items;
                select.group_by = group_exprs;
                Ok(SqlQuery::Select(select))
            }

            RaKind::TopN {
                limit,
                attribute,
                input,
            } => {
                let (mut select, rewrite) = self.absorbing_select(input)?;
                select.order_by = vec![SqlOrderBy {
                    expr: column_expr(&rewrite.apply(attribute)),
                    descending: true,
                }];
                select.limit = Some(*limit);
                Ok(SqlQuery::Select(select))
            }
        }
    }

    /// `[NOT] EXISTS` encoding of semi/anti joins, correlated on every
    /// shared column name
    fn compile_semi_anti(
        &mut self,
        left: &'a RaExpression,
        right: &'a RaExpression,
        negated: bool,
    ) -> TranspileResult<SqlQuery> {
        let left_schema = self.inferrer.infer(left)?;
        let right_schema = self.inferrer.infer(right)?;
        let shared = ResultSchema::shared_names(&left_schema, &right_schema);
        if shared.is_empty() {
            return Err(TranspileError::unsupported(
                "semi/anti join of relations with no shared column",
            ));
        }

        let (left_ref, left_label, _) = self.table_ref(left)?;
        let (right_ref, right_label, _) = self.table_ref(right)?;

        let mut inner = SqlSelect::star_from(right_ref);
        for name in &shared {
            inner.add_condition(SqlExpr::eq(
                SqlExpr::qualified(right_label.clone(), name.clone()),
                SqlExpr::qualified(left_label.clone(), name.clone()),
            ));
        }

        let mut outer = SqlSelect::star_from(left_ref);
        outer.add_condition(SqlExpr::Exists {
            query: Box::new(SqlQuery::Select(inner)),
            negated,
        });
        Ok(SqlQuery::Select(outer))
    }

    /// Double-negation encoding of division: keep a candidate when no
    /// divisor tuple lacks a matching dividend tuple
    fn compile_division(
        &mut self,
        division: &'a RaExpression,
        dividend: &'a RaExpression,
        divisor: &'a RaExpression,
    ) -> TranspileResult<SqlQuery> {
        let quotient: Vec<String> = self
            .inferrer
            .infer(division)?
            .attributes()
            .iter()
            .map(|a| a.name.clone())
            .collect();
        let divisor_cols: Vec<String> = self
            .inferrer
            .infer(divisor)?
            .attributes()
            .iter()
            .map(|a| a.name.clone())
            .collect();

        let (outer_ref, outer_label, _) = self.table_ref(dividend)?;
        let (divisor_ref, divisor_label, _) = self.table_ref(divisor)?;
        // second scan of the dividend always gets a fresh alias so its
        // columns stay distinguishable from the outer scan
        let inner_alias = self.fresh_alias();
        let inner_ref = match &dividend.kind {
            RaKind::Relation { name } => {
                SqlTableRef::aliased_table(name.clone(), inner_alias.clone())
            }
            _ => SqlTableRef::derived(self.compile(dividend)?, inner_alias.clone()),
        };

        let mut innermost = SqlSelect::star_from(inner_ref);
        for name in &quotient {
            innermost.add_condition(SqlExpr::eq(
                SqlExpr::qualified(inner_alias.clone(), name.clone()),
                SqlExpr::qualified(outer_label.clone(), name.clone()),
            ));
        }
        for name in &divisor_cols {
            innermost.add_condition(SqlExpr::eq(
                SqlExpr::qualified(inner_alias.clone(), name.clone()),
                SqlExpr::qualified(divisor_label.clone(), name.clone()),
            ));
        }

        let mut middle = SqlSelect::star_from(divisor_ref);
        middle.add_condition(SqlExpr::Exists {
            query: Box::new(SqlQuery::Select(innermost)),
            negated: true,
        });

        let mut outer = SqlSelect::star_from(outer_ref);
        outer.distinct = true;
        outer.items = quotient
            .iter()
            .map(|name| {
                SqlSelectItem::plain(SqlExpr::qualified(outer_label.clone(), name.clone()))
            })
            .collect();
        outer.add_condition(SqlExpr::Exists {
            query: Box::new(SqlQuery::Select(middle)),
            negated: true,
        });
        Ok(SqlQuery::Select(outer))
    }

    /// Compile an operand into a SELECT that can absorb a projection list,
    /// WHERE conjunct, grouping, or ordering. Grouped, limited, or
    /// set-operation operands are wrapped as derived tables, and the
    /// returned rewrite redirects attribute qualifiers at the wrapper
    /// alias.
    fn absorbing_select(
        &mut self,
        operand: &'a RaExpression,
    ) -> TranspileResult<(SqlSelect, QualifierRewrite)> {
        let compiled = self.compile(operand)?;
        match compiled {
            SqlQuery::Select(select)
                if select.group_by.is_empty()
                    && select.limit.is_none()
                    && select.items.is_empty()
                    && !select.distinct =>
            {
                Ok((select, QualifierRewrite::none()))
            }
            other => {
                let alias = self.fresh_alias();
                let inner_names: Vec<String> = self
                    .inferrer
                    .infer(operand)?
                    .relation_names()
                    .map(str::to_string)
                    .collect();
                let select =
                    SqlSelect::star_from(SqlTableRef::derived(other, alias.clone()));
                Ok((select, QualifierRewrite::to_alias(inner_names, alias)))
            }
        }
    }

    /// FROM-clause reference for an operand: bare relations stay tables,
    /// renamed relations become aliased tables, everything else becomes an
    /// aliased derived table. Returns the label conditions must use and
    /// the qualifier rewrite that redirects references at wrapped
    /// relations.
    fn table_ref(
        &mut self,
        operand: &'a RaExpression,
    ) -> TranspileResult<(SqlTableRef, String, QualifierRewrite)> {
        match &operand.kind {
            RaKind::Relation { name } => Ok((
                SqlTableRef::table(name.clone()),
                name.clone(),
                QualifierRewrite::none(),
            )),
            RaKind::Rename { alias, input } if matches!(input.kind, RaKind::Relation { .. }) => {
                let RaKind::Relation { name } = &input.kind else {
                    unreachable!("guard matched a relation");
                };
                Ok((
                    SqlTableRef::aliased_table(name.clone(), alias.clone()),
                    alias.clone(),
                    QualifierRewrite::none(),
                ))
            }
            _ => {
                let alias = self.fresh_alias();
                let inner_names: Vec<String> = self
                    .inferrer
                    .infer(operand)?
                    .relation_names()
                    .map(str::to_string)
                    .collect();
                let compiled = self.compile(operand)?;
                Ok((
                    SqlTableRef::derived(compiled, alias.clone()),
                    alias.clone(),
                    QualifierRewrite::to_alias(inner_names, alias),
                ))
            }
        }
    }
}

/// Attribute-qualifier rewrite applied to conditions whose operand was
/// wrapped behind a synthetic alias
struct QualifierRewrite {
    from: Vec<String>,
    to: Option<String>,
}

impl QualifierRewrite {
    fn none() -> Self {
        Self {
            from: Vec::new(),
            to: None,
        }
    }

    fn to_alias(from: Vec<String>, to: String) -> Self {
        Self {
            from,
            to: Some(to),
        }
    }

    fn apply(&self, attr: &Attribute) -> Attribute {
        let Some(to) = &self.to else {
            return attr.clone();
        };
        match &attr.relation {
            Some(rel) if self.from.iter().any(|f| f.eq_ignore_ascii_case(rel)) => {
                Attribute::qualified(to.clone(), attr.name.clone())
            }
            _ => attr.clone(),
        }
    }
}

fn column_expr(attr: &Attribute) -> SqlExpr {
    match &attr.relation {
        Some(rel) => SqlExpr::qualified(rel.clone(), attr.name.clone()),
        None => SqlExpr::column(attr.name.clone()),
    }
}

/// Convert an RA boolean expression into the writer's expression type
pub(crate) fn convert_condition(condition: &BooleanExpression) -> SqlExpr {
    match &condition.kind {
        BoolKind::And { left, right } => {
            convert_condition(left).and(convert_condition(right))
        }
        BoolKind::Or { left, right } => convert_condition(left).or(convert_condition(right)),
        BoolKind::Not { operand } => convert_condition(operand).negate(),
        BoolKind::Comparison { op, left, right } => SqlExpr::Compare {
            op: comparison_keyword(op),
            left: Box::new(convert_operand(left)),
            right: Box::new(convert_operand(right)),
        },
    }
}

fn comparison_keyword(op: &ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "=",
        ComparisonOp::NotEq => "<>",
        ComparisonOp::Lt => "<",
        ComparisonOp::LtEq => "<=",
        ComparisonOp::Gt => ">",
        ComparisonOp::GtEq => ">=",
    }
}

fn convert_operand(operand: &Operand) -> SqlExpr {
    match operand {
        Operand::Attribute(attr) => column_expr(attr),
        Operand::Literal(Literal::String(s)) => SqlExpr::Literal(SqlLiteral::String(s.clone())),
        Operand::Literal(Literal::Integer(n)) => SqlExpr::Literal(SqlLiteral::Integer(*n)),
        Operand::Literal(Literal::Float(x)) => SqlExpr::Literal(SqlLiteral::Float(*x)),
        Operand::Literal(Literal::Boolean(b)) => SqlExpr::Literal(SqlLiteral::Boolean(*b)),
    }
}

#[cfg(test)]
#[path = "ra_to_sql_test.rs"]
mod tests;
