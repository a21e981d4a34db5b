//! SQL→RA compilation, including correlated-subquery flattening
//!
//! FROM/JOIN clauses map directly onto the algebra. The WHERE clause is
//! split into top-level conjuncts (after the IN/ANY/ALL→EXISTS
//! normalization): existence predicates flatten into semi/anti joins on
//! their correlated parameters, and the subquery-free remainder becomes a
//! trailing selection.

use crate::error::{TranspileError, TranspileResult};
use crate::normalize::{classify, split_conjuncts, Predicate};
use relab_analysis::SchemaInferrer;
use relab_core::{Attribute, RelationalSchema, Resolution, ResultSchema};
use relab_ra::{
    AggregateFunction, Aggregation, BooleanExpression, ComparisonOp, Literal, Operand,
    RaExpression,
};
use relab_sql::validate_query;
use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, Join,
    JoinConstraint, JoinOperator, Query, Select, SelectItem, SetExpr, SetOperator, TableFactor,
    TableWithJoins, UnaryOperator, Value,
};

/// Compile a validated SQL query into an RA expression
pub fn sql_to_ra(query: &Query, schema: &RelationalSchema) -> TranspileResult<RaExpression> {
    validate_query(query, schema)?;
    compile_query(query, schema)
}

fn compile_query(query: &Query, schema: &RelationalSchema) -> TranspileResult<RaExpression> {
    let base = compile_body(&query.body, schema)?;

    let order_exprs = query.order_by.as_ref().map(|ob| &ob.exprs[..]).unwrap_or(&[]);
    match (order_exprs, &query.limit) {
        ([], None) => Ok(base),
        ([key], Some(limit)) => {
            if key.asc.unwrap_or(true) {
                return Err(TranspileError::unsupported(
                    "ascending ORDER BY (top-n keeps the largest values)",
                ));
            }
            let attr = column_attribute(&key.expr).ok_or_else(|| {
                TranspileError::unsupported("ORDER BY key that is not a plain column")
            })?;
            let n = limit_value(limit)?;
            Ok(base.top_n(n, attr))
        }
        ([_, ..], Some(_)) => Err(TranspileError::unsupported("multiple ORDER BY keys")),
        ([_, ..], None) => Err(TranspileError::unsupported("ORDER BY without LIMIT")),
        ([], Some(_)) => Err(TranspileError::unsupported("LIMIT without ORDER BY")),
    }
}

fn limit_value(expr: &Expr) -> TranspileResult<u64> {
    match expr {
        Expr::Value(Value::Number(n, _)) => n
            .parse()
            .map_err(|_| TranspileError::unsupported(format!("LIMIT {n}"))),
        other => Err(TranspileError::unsupported(format!("LIMIT {other}"))),
    }
}

fn compile_body(body: &SetExpr, schema: &RelationalSchema) -> TranspileResult<RaExpression> {
    match body {
        SetExpr::Select(select) => compile_select(select, schema),
        SetExpr::Query(inner) => compile_query(inner, schema),
        SetExpr::SetOperation {
            op, left, right, ..
        } => {
            let left_ra = compile_body(left, schema)?;
            let right_ra = compile_body(right, schema)?;
            match op {
                SetOperator::Union => Ok(left_ra.union(right_ra)),
                SetOperator::Intersect => Ok(left_ra.intersect(right_ra)),
                SetOperator::Except => Ok(left_ra.difference(right_ra)),
                #[allow(unreachable_patterns)]
                other => Err(TranspileError::unsupported(format!("set operator {other}"))),
            }
        }
        other => Err(TranspileError::unsupported(format!(
            "query body {:?}",
            std::mem::discriminant(other)
        ))),
    }
}

fn compile_select(select: &Select, schema: &RelationalSchema) -> TranspileResult<RaExpression> {
    // FROM / JOIN
    let mut base = compile_from(&select.from, schema)?;

    // WHERE: bucket the conjuncts, flatten existence predicates, keep the
    // rest for a trailing selection
    if let Some(where_clause) = &select.selection {
        let mut plain: Option<BooleanExpression> = None;
        for conjunct in split_conjuncts(where_clause) {
            match classify(conjunct)? {
                Predicate::Plain(expr) => {
                    let converted = convert_bool_expr(expr)?;
                    plain = Some(match plain {
                        Some(existing) => existing.and(converted),
                        None => converted,
                    });
                }
                Predicate::Exists {
                    query,
                    negated,
                    correlation_lhs,
                } => {
                    base = attach_exists(base, query, negated, correlation_lhs, schema)?;
                }
            }
        }
        if let Some(condition) = plain {
            base = base.select(condition);
        }
    }

    // GROUP BY / aggregates
    let group_exprs: &[Expr] = match &select.group_by {
        GroupByExpr::Expressions(exprs, _) => exprs,
        _ => return Err(TranspileError::unsupported("GROUP BY ALL")),
    };
    let has_aggregates = select.projection.iter().any(|item| match item {
        SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => {
            matches!(aggregate_call(e), Ok(Some(_)))
        }
        _ => false,
    });

    if !group_exprs.is_empty() || has_aggregates {
        base = compile_aggregation(base, select, group_exprs, schema)?;
    } else {
        base = compile_projection(base, &select.projection, schema)?;
    }

    Ok(base)
}

/// FROM clause → relation/join tree
fn compile_from(
    from: &[TableWithJoins],
    schema: &RelationalSchema,
) -> TranspileResult<RaExpression> {
    let Some(first) = from.first() else {
        return Err(TranspileError::unsupported("SELECT without FROM"));
    };
    let mut expr = factor_to_ra(&first.relation, schema)?;
    for join in &first.joins {
        expr = apply_join(expr, join, schema)?;
    }
    for table_with_joins in &from[1..] {
        let mut right = factor_to_ra(&table_with_joins.relation, schema)?;
        for join in &table_with_joins.joins {
            right = apply_join(right, join, schema)?;
        }
        expr = expr.cartesian(right);
    }
    Ok(expr)
}

fn factor_to_ra(factor: &TableFactor, schema: &RelationalSchema) -> TranspileResult<RaExpression> {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let table_name = name
                .0
                .last()
                .map(|i| i.value.clone())
                .unwrap_or_else(|| name.to_string());
            let relation = RaExpression::relation(table_name);
            Ok(match alias {
                Some(a) => relation.rename(a.name.value.clone()),
                None => relation,
            })
        }
        TableFactor::Derived {
            subquery, alias, ..
        } => {
            let inner = compile_query(subquery, schema)?;
            let alias = alias
                .as_ref()
                .map(|a| a.name.value.clone())
                .ok_or_else(|| TranspileError::unsupported("derived table without an alias"))?;
            Ok(inner.rename(alias))
        }
        other => Err(TranspileError::unsupported(format!(
            "table factor {:?}",
            std::mem::discriminant(other)
        ))),
    }
}

fn apply_join(
    left: RaExpression,
    join: &Join,
    schema: &RelationalSchema,
) -> TranspileResult<RaExpression> {
    let right = factor_to_ra(&join.relation, schema)?;
    match &join.join_operator {
        JoinOperator::Inner(JoinConstraint::Natural) => Ok(left.natural_join(right)),
        JoinOperator::Inner(JoinConstraint::On(on_expr)) => {
            let condition = convert_bool_expr(on_expr)?;
            Ok(left.theta_join(right, condition))
        }
        JoinOperator::Inner(JoinConstraint::Using(columns)) => {
            let using: Vec<String> = columns.iter().map(|c| c.value.clone()).collect();
            let shared = shared_names(&left, &right, schema)?;
            if same_name_set(&using, &shared) {
                Ok(left.natural_join(right))
            } else {
                Err(TranspileError::unsupported(
                    "USING join on a subset of the shared columns",
                ))
            }
        }
        JoinOperator::Inner(JoinConstraint::None) => {
            Err(TranspileError::unsupported("join without a condition"))
        }
        JoinOperator::LeftOuter(JoinConstraint::Natural) => Ok(left.left_join(right)),
        JoinOperator::RightOuter(JoinConstraint::Natural) => Ok(left.right_join(right)),
        JoinOperator::FullOuter(JoinConstraint::Natural) => Ok(left.outer_join(right)),
        JoinOperator::LeftOuter(_) | JoinOperator::RightOuter(_) | JoinOperator::FullOuter(_) => {
            Err(TranspileError::unsupported(
                "outer join with an explicit condition (the algebra's outer joins are natural)",
            ))
        }
        JoinOperator::CrossJoin => Ok(left.cartesian(right)),
        other => Err(TranspileError::unsupported(format!(
            "join operator {:?}",
            std::mem::discriminant(other)
        ))),
    }
}

/// Output schema of an intermediate RA expression
fn output_schema(
    expr: &RaExpression,
    schema: &RelationalSchema,
) -> TranspileResult<ResultSchema> {
    Ok(SchemaInferrer::new(schema).infer(expr)?)
}

fn shared_names(
    left: &RaExpression,
    right: &RaExpression,
    schema: &RelationalSchema,
) -> TranspileResult<Vec<String>> {
    let left_schema = output_schema(left, schema)?;
    let right_schema = output_schema(right, schema)?;
    Ok(ResultSchema::shared_names(&left_schema, &right_schema))
}

fn same_name_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|x| b.iter().any(|y| y.eq_ignore_ascii_case(x)))
}

/// Flatten one `[NOT] EXISTS` predicate into a semi/anti join.
///
/// The subquery's correlated parameters are the outer columns it references
/// but does not itself define; the subquery (restricted by its local
/// predicates, projected onto the parameters when necessary) attaches via a
/// natural semi join on those parameters, or an anti join for `NOT EXISTS`.
fn attach_exists(
    base: RaExpression,
    subquery: &Query,
    negated: bool,
    correlation_lhs: Option<&Expr>,
    schema: &RelationalSchema,
) -> TranspileResult<RaExpression> {
    let SetExpr::Select(inner_select) = subquery.body.as_ref() else {
        return Err(TranspileError::unsupported("set operation inside EXISTS"));
    };

    let mut inner = compile_from(&inner_select.from, schema)?;
    let outer_schema = output_schema(&base, schema)?;

    let mut parameters: Vec<String> = Vec::new();
    let mut local: Option<BooleanExpression> = None;

    if let Some(inner_where) = &inner_select.selection {
        for conjunct in split_conjuncts(inner_where) {
            match classify(conjunct)? {
                Predicate::Exists {
                    query,
                    negated: inner_negated,
                    correlation_lhs: inner_lhs,
                } => {
                    // a nested existence predicate correlates with the
                    // subquery's own relations
                    inner = attach_exists(inner, query, inner_negated, inner_lhs, schema)?;
                }
                Predicate::Plain(expr) => {
                    let inner_schema = output_schema(&inner, schema)?;
                    match classify_conjunct_refs(expr, &inner_schema, &outer_schema)? {
                        ConjunctKind::Local => {
                            let converted = convert_bool_expr(expr)?;
                            local = Some(match local {
                                Some(existing) => existing.and(converted),
                                None => converted,
                            });
                        }
                        ConjunctKind::Correlation(name) => {
                            if !parameters.iter().any(|p| p.eq_ignore_ascii_case(&name)) {
                                parameters.push(name);
                            }
                        }
                    }
                }
            }
        }
    }

    // IN/ANY/ALL correlate on the subquery's first output column
    if let Some(lhs) = correlation_lhs {
        let outer_attr = column_attribute(lhs)
            .ok_or_else(|| TranspileError::unsupported("IN over a computed expression"))?;
        let inner_attr = first_output_column(inner_select)?;
        if !outer_attr.name.eq_ignore_ascii_case(&inner_attr.name) {
            return Err(TranspileError::unsupported(format!(
                "IN correlating '{}' with the differently named column '{}'",
                outer_attr.name, inner_attr.name
            )));
        }
        if !parameters
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&inner_attr.name))
        {
            parameters.push(inner_attr.name.clone());
        }
    }

    if parameters.is_empty() {
        return Err(TranspileError::unsupported("uncorrelated EXISTS subquery"));
    }

    if let Some(condition) = local {
        inner = inner.select(condition);
    }

    // attach on exactly the parameters: project unless they already are the
    // full shared set
    let inner_schema = output_schema(&inner, schema)?;
    let shared = ResultSchema::shared_names(&outer_schema, &inner_schema);
    if !same_name_set(&parameters, &shared) {
        inner = inner.project(parameters.iter().map(Attribute::new).collect());
    }

    Ok(if negated {
        base.anti_join(inner)
    } else {
        base.semi_join(inner)
    })
}

enum ConjunctKind {
    /// References only subquery-local columns (or literals)
    Local,
    /// An equality correlating an inner column with an outer column of the
    /// same name; carries that shared name
    Correlation(String),
}

/// Decide whether an inner-WHERE conjunct is local or a correlation, per
/// the resolution of its column references against the two scopes
fn classify_conjunct_refs(
    expr: &Expr,
    inner_schema: &ResultSchema,
    outer_schema: &ResultSchema,
) -> TranspileResult<ConjunctKind> {
    let refs = column_refs(expr);
    let is_outer_only = |attr: &Attribute| {
        matches!(inner_schema.resolve(attr), Resolution::NotFound)
            && !matches!(outer_schema.resolve(attr), Resolution::NotFound)
    };

    if !refs.iter().any(|r| is_outer_only(r)) {
        return Ok(ConjunctKind::Local);
    }

    // outer references only make sense in a same-name equality correlation
    if let Expr::BinaryOp {
        left,
        op: BinaryOperator::Eq,
        right,
    } = expr
    {
        if let (Some(left_attr), Some(right_attr)) =
            (column_attribute(left), column_attribute(right))
        {
            let (inner_attr, outer_attr) = if is_outer_only(&left_attr) {
                (&right_attr, &left_attr)
            } else {
                (&left_attr, &right_attr)
            };
            if is_outer_only(outer_attr)
                && !matches!(inner_schema.resolve(inner_attr), Resolution::NotFound)
                && inner_attr.name.eq_ignore_ascii_case(&outer_attr.name)
            {
                return Ok(ConjunctKind::Correlation(inner_attr.name.clone()));
            }
            return Err(TranspileError::unsupported(format!(
                "correlation between differently named columns '{}' and '{}'",
                inner_attr.name, outer_attr.name
            )));
        }
    }
    Err(TranspileError::unsupported(
        "non-equality correlated predicate",
    ))
}

/// All column references in an expression
fn column_refs(expr: &Expr) -> Vec<Attribute> {
    let mut out = Vec::new();
    collect_column_refs(expr, &mut out);
    out
}

fn collect_column_refs(expr: &Expr, out: &mut Vec<Attribute>) {
    match expr {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
            if let Some(attr) = column_attribute(expr) {
                out.push(attr);
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_column_refs(left, out);
            collect_column_refs(right, out);
        }
        Expr::UnaryOp { expr, .. } => collect_column_refs(expr, out),
        Expr::Nested(inner) => collect_column_refs(inner, out),
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => collect_column_refs(inner, out),
        Expr::Between {
            expr, low, high, ..
        } => {
            collect_column_refs(expr, out);
            collect_column_refs(low, out);
            collect_column_refs(high, out);
        }
        Expr::InList { expr, list, .. } => {
            collect_column_refs(expr, out);
            for item in list {
                collect_column_refs(item, out);
            }
        }
        Expr::Cast { expr, .. } => collect_column_refs(expr, out),
        _ => {}
    }
}

/// First output column of a subquery's select list, as an attribute
fn first_output_column(select: &Select) -> TranspileResult<Attribute> {
    match select.projection.first() {
        Some(SelectItem::UnnamedExpr(expr)) | Some(SelectItem::ExprWithAlias { expr, .. }) => {
            column_attribute(expr).ok_or_else(|| {
                TranspileError::unsupported("IN subquery selecting a computed expression")
            })
        }
        _ => Err(TranspileError::unsupported(
            "IN subquery without a plain column select list",
        )),
    }
}

// ---- projection and aggregation ------------------------------------------

fn compile_projection(
    base: RaExpression,
    projection: &[SelectItem],
    schema: &RelationalSchema,
) -> TranspileResult<RaExpression> {
    // SELECT * keeps the operand's columns: no projection node
    if matches!(projection, [SelectItem::Wildcard(_)]) {
        return Ok(base);
    }

    let mut attributes = Vec::new();
    for item in projection {
        match item {
            SelectItem::UnnamedExpr(expr) => {
                let attr = column_attribute(expr).ok_or_else(|| {
                    TranspileError::unsupported(format!("computed select item {expr}"))
                })?;
                attributes.push(attr);
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                let attr = column_attribute(expr).ok_or_else(|| {
                    TranspileError::unsupported(format!("computed select item {expr}"))
                })?;
                if !attr.name.eq_ignore_ascii_case(&alias.value) {
                    return Err(TranspileError::unsupported(format!(
                        "renaming column '{}' to '{}' (the algebra's projection keeps names)",
                        attr.name, alias.value
                    )));
                }
                attributes.push(attr);
            }
            SelectItem::QualifiedWildcard(name, _) => {
                let relation = name.to_string();
                let base_schema = output_schema(&base, schema)?;
                let group = base_schema
                    .groups()
                    .iter()
                    .find(|(k, _)| {
                        k.as_deref().is_some_and(|k| k.eq_ignore_ascii_case(&relation))
                    })
                    .ok_or_else(|| {
                        TranspileError::unsupported(format!("unknown qualifier {relation}.*"))
                    })?;
                for col in &group.1 {
                    attributes.push(Attribute::qualified(relation.clone(), col.name.clone()));
                }
            }
            SelectItem::Wildcard(_) => {
                return Err(TranspileError::unsupported(
                    "star mixed with explicit select items",
                ))
            }
        }
    }
    Ok(base.project(attributes))
}

fn compile_aggregation(
    base: RaExpression,
    select: &Select,
    group_exprs: &[Expr],
    schema: &RelationalSchema,
) -> TranspileResult<RaExpression> {
    let mut group_by = Vec::new();
    for expr in group_exprs {
        let attr = column_attribute(expr).ok_or_else(|| {
            TranspileError::unsupported(format!("GROUP BY over the expression {expr}"))
        })?;
        group_by.push(attr);
    }

    let input_schema = output_schema(&base, schema)?;
    let mut aggregations = Vec::new();
    let mut output_order = Vec::new();
    for item in &select.projection {
        let (expr, alias) = match item {
            SelectItem::UnnamedExpr(expr) => (expr, None),
            SelectItem::ExprWithAlias { expr, alias } => (expr, Some(alias.value.clone())),
            _ => {
                return Err(TranspileError::unsupported(
                    "star select under GROUP BY",
                ))
            }
        };
        match aggregate_call(expr)? {
            Some((function, arg)) => {
                let input = match arg {
                    AggregateArg::Column(attr) => attr,
                    AggregateArg::Star => star_count_input(&group_by, &input_schema)?,
                };
                let output =
                    alias.unwrap_or_else(|| function.name().to_string());
                output_order.push(output.clone());
                aggregations.push(Aggregation::new(input, function, output));
            }
            None => {
                let attr = column_attribute(expr).ok_or_else(|| {
                    TranspileError::unsupported(format!("computed select item {expr}"))
                })?;
                output_order.push(attr.name.clone());
            }
        }
    }
    if aggregations.is_empty() {
        return Err(TranspileError::unsupported(
            "GROUP BY without an aggregate select item",
        ));
    }

    let mut result = base.aggregate(group_by.clone(), aggregations.clone());

    // HAVING filters the aggregation's output
    if let Some(having) = &select.having {
        let condition = convert_having(having, &aggregations)?;
        result = result.select(condition);
    }

    // re-project when the select order differs from the natural
    // groups-then-aggregates output
    let natural: Vec<String> = group_by
        .iter()
        .map(|a| a.name.clone())
        .chain(aggregations.iter().map(|a| a.output.clone()))
        .collect();
    if output_order != natural {
        result = result.project(output_order.iter().map(Attribute::new).collect());
    }
    Ok(result)
}

/// Input attribute standing in for `COUNT(*)`: the first group-by
/// attribute, or the operand's first column
fn star_count_input(
    group_by: &[Attribute],
    input_schema: &ResultSchema,
) -> TranspileResult<Attribute> {
    if let Some(attr) = group_by.first() {
        return Ok(attr.clone());
    }
    input_schema
        .attributes()
        .first()
        .map(|a| Attribute::new(a.name.clone()))
        .ok_or_else(|| TranspileError::unsupported("COUNT(*) over an empty relation"))
}

enum AggregateArg {
    Column(Attribute),
    Star,
}

/// Recognize one of the five aggregate calls over a plain column or `*`
fn aggregate_call(expr: &Expr) -> TranspileResult<Option<(AggregateFunction, AggregateArg)>> {
    let Expr::Function(func) = expr else {
        return Ok(None);
    };
    let Some(function) = AggregateFunction::parse(&func.name.to_string()) else {
        return Ok(None);
    };
    let FunctionArguments::List(list) = &func.args else {
        return Err(TranspileError::unsupported(format!(
            "{} without an argument list",
            function.sql_name()
        )));
    };
    match list.args.as_slice() {
        [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)] => {
            Ok(Some((function, AggregateArg::Star)))
        }
        [FunctionArg::Unnamed(FunctionArgExpr::Expr(arg))] => {
            let attr = column_attribute(arg).ok_or_else(|| {
                TranspileError::unsupported(format!(
                    "{} over a computed expression",
                    function.sql_name()
                ))
            })?;
            Ok(Some((function, AggregateArg::Column(attr))))
        }
        _ => Err(TranspileError::unsupported(format!(
            "{} with several arguments",
            function.sql_name()
        ))),
    }
}

/// Convert a HAVING condition, replacing aggregate calls with the output
/// attribute of the matching aggregation
fn convert_having(
    expr: &Expr,
    aggregations: &[Aggregation],
) -> TranspileResult<BooleanExpression> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => Ok(convert_having(left, aggregations)?.and(convert_having(right, aggregations)?)),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => Ok(convert_having(left, aggregations)?.or(convert_having(right, aggregations)?)),
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: inner,
        } => Ok(convert_having(inner, aggregations)?.negate()),
        Expr::Nested(inner) => convert_having(inner, aggregations),
        Expr::BinaryOp { left, op, right } => {
            let op = comparison_op(op)?;
            let left = having_operand(left, aggregations)?;
            let right = having_operand(right, aggregations)?;
            Ok(BooleanExpression::comparison(op, left, right))
        }
        other => Err(TranspileError::unsupported(format!(
            "HAVING condition {other}"
        ))),
    }
}

fn having_operand(expr: &Expr, aggregations: &[Aggregation]) -> TranspileResult<Operand> {
    if let Ok(Some(_)) = aggregate_call(expr) {
        let key = expr.to_string();
        let matching = aggregations
            .iter()
            .find(|agg| aggregate_key(agg) == key)
            .ok_or_else(|| {
                TranspileError::unsupported(format!(
                    "HAVING aggregate {key} absent from the select list"
                ))
            })?;
        return Ok(Operand::Attribute(Attribute::new(matching.output.clone())));
    }
    convert_operand(expr)
}

/// Canonical key an aggregation would have printed as SQL
fn aggregate_key(agg: &Aggregation) -> String {
    format!("{}({})", agg.function.sql_name(), agg.input)
}

// ---- expression conversion -----------------------------------------------

/// Convert a subquery-free SQL boolean expression into the RA form
fn convert_bool_expr(expr: &Expr) -> TranspileResult<BooleanExpression> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => Ok(convert_bool_expr(left)?.and(convert_bool_expr(right)?)),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => Ok(convert_bool_expr(left)?.or(convert_bool_expr(right)?)),
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: inner,
        } => Ok(convert_bool_expr(inner)?.negate()),
        Expr::Nested(inner) => convert_bool_expr(inner),
        Expr::BinaryOp { left, op, right } => {
            let op = comparison_op(op)?;
            Ok(BooleanExpression::comparison(
                op,
                convert_operand(left)?,
                convert_operand(right)?,
            ))
        }
        other => Err(TranspileError::unsupported(format!("condition {other}"))),
    }
}

fn comparison_op(op: &BinaryOperator) -> TranspileResult<ComparisonOp> {
    match op {
        BinaryOperator::Eq => Ok(ComparisonOp::Eq),
        BinaryOperator::NotEq => Ok(ComparisonOp::NotEq),
        BinaryOperator::Lt => Ok(ComparisonOp::Lt),
        BinaryOperator::LtEq => Ok(ComparisonOp::LtEq),
        BinaryOperator::Gt => Ok(ComparisonOp::Gt),
        BinaryOperator::GtEq => Ok(ComparisonOp::GtEq),
        other => Err(TranspileError::unsupported(format!("operator {other}"))),
    }
}

fn convert_operand(expr: &Expr) -> TranspileResult<Operand> {
    if let Some(attr) = column_attribute(expr) {
        return Ok(Operand::Attribute(attr));
    }
    match expr {
        Expr::Value(Value::Number(n, _)) => {
            if let Ok(i) = n.parse::<i64>() {
                Ok(Operand::Literal(Literal::Integer(i)))
            } else if let Ok(x) = n.parse::<f64>() {
                Ok(Operand::Literal(Literal::Float(x)))
            } else {
                Err(TranspileError::unsupported(format!("number {n}")))
            }
        }
        Expr::Value(Value::SingleQuotedString(s)) => {
            Ok(Operand::Literal(Literal::String(s.clone())))
        }
        Expr::Value(Value::Boolean(b)) => Ok(Operand::Literal(Literal::Boolean(*b))),
        Expr::Nested(inner) => convert_operand(inner),
        other => Err(TranspileError::unsupported(format!("operand {other}"))),
    }
}

/// A plain (possibly qualified) column reference, if the expression is one
fn column_attribute(expr: &Expr) -> Option<Attribute> {
    match expr {
        Expr::Identifier(ident) => Some(Attribute::new(ident.value.clone())),
        Expr::CompoundIdentifier(parts) => match parts.len() {
            1 => Some(Attribute::new(parts[0].value.clone())),
            n => Some(Attribute::qualified(
                parts[n - 2].value.clone(),
                parts[n - 1].value.clone(),
            )),
        },
        Expr::Nested(inner) => column_attribute(inner),
        _ => None,
    }
}

#[cfg(test)]
#[path = "sql_to_ra_test.rs"]
mod tests;
