//! Schema-aware semantic validation of SQL queries
//!
//! Walks the `sqlparser` AST bottom-up against a schema, building one
//! `Scope` per SELECT. Stops at the first semantic error. Constructs
//! outside the teaching subset raise `NotImplemented`, which is fatal to
//! the call and never presented as a semantic explanation.

use crate::scope::{GroupByScope, ProjectionItem, Scope, TablesScope};
use relab_core::{
    Attribute, DataType, RelationalSchema, Resolution, ResultSchema, SemanticError,
    SemanticResult, TypedAttribute,
};
use sqlparser::ast::{
    Distinct, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, Join,
    JoinConstraint, JoinOperator, OrderByExpr, Query, Select, SelectItem, SetExpr, SetOperator,
    TableFactor, Value,
};

/// Validate a query against a schema, raising the first semantic error
pub fn validate_query(query: &Query, schema: &RelationalSchema) -> SemanticResult<()> {
    QueryChecker { schema }.check_query(query, None).map(|_| ())
}

/// Validate a query and return its output schema
pub fn query_output_schema(
    query: &Query,
    schema: &RelationalSchema,
) -> SemanticResult<ResultSchema> {
    QueryChecker { schema }.check_query(query, None)
}

/// Clause being validated; decides which expression rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Where,
    Select,
    Having,
    OrderBy,
    GroupBy,
    JoinOn,
}

/// Expression-walk context
#[derive(Debug, Clone, Copy)]
struct ExprContext {
    clause: Clause,
    in_aggregate: bool,
    enforce_grouping: bool,
}

impl ExprContext {
    fn new(clause: Clause, enforce_grouping: bool) -> Self {
        Self {
            clause,
            in_aggregate: false,
            enforce_grouping,
        }
    }

    fn inside_aggregate(self) -> Self {
        Self {
            in_aggregate: true,
            enforce_grouping: false,
            ..self
        }
    }

    fn without_grouping(self) -> Self {
        Self {
            enforce_grouping: false,
            ..self
        }
    }
}

fn not_implemented(construct: impl Into<String>) -> SemanticError {
    let construct = construct.into();
    log::debug!("construct outside the teaching subset: {construct}");
    SemanticError::NotImplemented { construct }
}

struct QueryChecker<'s> {
    schema: &'s RelationalSchema,
}

impl QueryChecker<'_> {
    fn check_query(&self, query: &Query, parent: Option<&Scope>) -> SemanticResult<ResultSchema> {
        if query.with.is_some() {
            return Err(not_implemented("WITH (common table expressions)"));
        }

        let (output, scope) = self.check_set_expr(&query.body, parent)?;

        if let Some(order_by) = &query.order_by {
            match &scope {
                Some(scope) => self.check_order_by(&order_by.exprs, scope, &output)?,
                None => {
                    // set-operation body: order by output name or position only
                    let mut synthetic = Scope::new(None);
                    synthetic.tables = TablesScope::from_result_schema(output.clone());
                    self.check_order_by(&order_by.exprs, &synthetic, &output)?;
                }
            }
        }

        if let Some(limit) = &query.limit {
            self.check_limit_value(limit)?;
        }
        if let Some(offset) = &query.offset {
            self.check_limit_value(&offset.value)?;
        }

        Ok(output)
    }

    fn check_limit_value(&self, expr: &Expr) -> SemanticResult<()> {
        match expr {
            Expr::Value(Value::Number(_, _)) => Ok(()),
            other => Err(not_implemented(format!("non-literal LIMIT/OFFSET {other}"))),
        }
    }

    fn check_set_expr<'p>(
        &self,
        body: &SetExpr,
        parent: Option<&'p Scope<'p>>,
    ) -> SemanticResult<(ResultSchema, Option<Scope<'p>>)> {
        match body {
            SetExpr::Select(select) => {
                let (output, scope) = self.check_select(select, parent)?;
                Ok((output, Some(scope)))
            }
            SetExpr::Query(inner) => {
                let output = self.check_query(inner, parent)?;
                Ok((output, None))
            }
            SetExpr::SetOperation {
                op, left, right, ..
            } => {
                if !matches!(
                    op,
                    SetOperator::Union | SetOperator::Intersect | SetOperator::Except
                ) {
                    return Err(not_implemented(format!("set operator {op}")));
                }
                let (left_out, _) = self.check_set_expr(left, parent)?;
                let (right_out, _) = self.check_set_expr(right, parent)?;
                if left_out.len() != right_out.len() {
                    return Err(SemanticError::ColumnCountMismatch {
                        left: left_out.len(),
                        right: right_out.len(),
                        position: None,
                    });
                }
                for (i, (l, r)) in left_out
                    .attributes()
                    .iter()
                    .zip(right_out.attributes())
                    .enumerate()
                {
                    if !l.data_type.is_comparable_with(&r.data_type) {
                        return Err(SemanticError::ColumnTypeMismatch {
                            index: i + 1,
                            left: l.data_type,
                            right: r.data_type,
                            position: None,
                        });
                    }
                }
                let attrs = left_out.attributes().to_vec();
                Ok((ResultSchema::under_key(None, attrs), None))
            }
            other => Err(not_implemented(format!(
                "query body {:?}",
                std::mem::discriminant(other)
            ))),
        }
    }

    fn check_select<'p>(
        &self,
        select: &Select,
        parent: Option<&'p Scope<'p>>,
    ) -> SemanticResult<(ResultSchema, Scope<'p>)> {
        let mut scope = Scope::new(parent);

        // 1. FROM — tables, derived tables, joins
        for table_with_joins in &select.from {
            self.add_table_factor(&mut scope, &table_with_joins.relation, parent, None)?;
            for join in &table_with_joins.joins {
                self.add_join(&mut scope, join, parent)?;
            }
        }

        // 2. WHERE — aggregate-free, boolean
        if let Some(where_clause) = &select.selection {
            let ctx = ExprContext::new(Clause::Where, false);
            let ty = self.check_expr(where_clause, &scope, ctx)?;
            require_boolean(ty)?;
        }

        // 3. GROUP BY — establishes the grouped scope
        match &select.group_by {
            GroupByExpr::Expressions(exprs, _) if !exprs.is_empty() => {
                let mut group_scope = GroupByScope::new();
                let ctx = ExprContext::new(Clause::GroupBy, false);
                for expr in exprs {
                    self.check_expr(expr, &scope, ctx)?;
                    group_scope.add_key(expr.to_string());
                    if let Some(name) = column_name_of(expr) {
                        group_scope.add_name(name);
                    }
                }
                scope.group_by = Some(group_scope);
            }
            GroupByExpr::Expressions(_, _) => {}
            _ => return Err(not_implemented("GROUP BY ALL")),
        }
        // HAVING or an aggregate select item without GROUP BY still grades
        // the whole result as one group
        let any_aggregate_item = select.projection.iter().any(|item| match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                contains_aggregate(expr)
            }
            _ => false,
        });
        if (select.having.is_some() || any_aggregate_item) && scope.group_by.is_none() {
            scope.group_by = Some(GroupByScope::new());
        }

        if let Some(distinct) = &select.distinct {
            if !matches!(distinct, Distinct::Distinct) {
                return Err(not_implemented("DISTINCT ON"));
            }
        }

        // 4. SELECT items
        let grouped = scope.is_grouped();
        let ctx = ExprContext::new(Clause::Select, grouped);
        let mut items: Vec<ProjectionItem> = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => {
                    let ty = self.check_expr(expr, &scope, ctx)?;
                    items.push(ProjectionItem {
                        name: infer_item_name(expr),
                        explicit_alias: false,
                        expr_key: expr.to_string(),
                        data_type: ty,
                        is_aggregate: contains_aggregate(expr),
                    });
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    let ty = self.check_expr(expr, &scope, ctx)?;
                    items.push(ProjectionItem {
                        name: Some(alias.value.clone()),
                        explicit_alias: true,
                        expr_key: expr.to_string(),
                        data_type: ty,
                        is_aggregate: contains_aggregate(expr),
                    });
                }
                SelectItem::Wildcard(_) => {
                    self.expand_wildcard(&scope, None, &mut items)?;
                }
                SelectItem::QualifiedWildcard(name, _) => {
                    let relation = name.to_string();
                    self.expand_wildcard(&scope, Some(&relation), &mut items)?;
                }
            }
        }
        for item in items {
            scope.projections.add(item)?;
        }

        // aliases of grouped expressions participate in the grouped checks
        if let Some(group_scope) = &mut scope.group_by {
            let grouped_aliases: Vec<String> = scope
                .projections
                .items()
                .iter()
                .filter(|i| i.explicit_alias && group_scope.contains_key(&i.expr_key))
                .filter_map(|i| i.name.clone())
                .collect();
            for alias in grouped_aliases {
                group_scope.add_name(alias);
            }
        }

        // 5. HAVING — aggregates allowed, grouped rules apply
        if let Some(having) = &select.having {
            let ctx = ExprContext::new(Clause::Having, scope.is_grouped());
            let ty = self.check_expr(having, &scope, ctx)?;
            require_boolean(ty)?;
        }

        let output = ResultSchema::under_key(
            None,
            scope
                .projections
                .items()
                .iter()
                .map(|i| {
                    TypedAttribute::new(
                        i.name.clone().unwrap_or_else(|| i.expr_key.clone()),
                        i.data_type,
                    )
                })
                .collect(),
        );
        Ok((output, scope))
    }

    /// Expand `*` or `relation.*` into projection items
    fn expand_wildcard(
        &self,
        scope: &Scope,
        relation: Option<&str>,
        items: &mut Vec<ProjectionItem>,
    ) -> SemanticResult<()> {
        let columns: Vec<TypedAttribute> = match relation {
            None => scope.tables.schema().attributes().to_vec(),
            Some(rel) => {
                let group = scope
                    .tables
                    .schema()
                    .groups()
                    .iter()
                    .find(|(k, _)| k.as_deref().is_some_and(|k| k.eq_ignore_ascii_case(rel)));
                match group {
                    Some((_, cols)) => cols.clone(),
                    None => {
                        return Err(SemanticError::RelationNotFound {
                            name: rel.to_string(),
                            position: None,
                        })
                    }
                }
            }
        };
        for col in columns {
            if let Some(group_scope) = &scope.group_by {
                if !group_scope.contains_name(&col.name) {
                    return Err(SemanticError::UngroupedColumn {
                        column: col.name.clone(),
                        position: None,
                    });
                }
            }
            items.push(ProjectionItem {
                name: Some(col.name.clone()),
                explicit_alias: false,
                expr_key: col.name.clone(),
                data_type: col.data_type,
                is_aggregate: false,
            });
        }
        Ok(())
    }

    // ---- FROM clause ------------------------------------------------------

    fn add_table_factor(
        &self,
        scope: &mut Scope,
        factor: &TableFactor,
        parent: Option<&Scope>,
        join: Option<&JoinConstraint>,
    ) -> SemanticResult<()> {
        let (label, table_schema) = self.table_factor_schema(factor, parent)?;
        match join {
            None | Some(JoinConstraint::On(_)) => scope.tables.add(&label, table_schema),
            Some(JoinConstraint::Natural) => scope.tables.add_natural(&label, table_schema),
            Some(JoinConstraint::Using(columns)) => {
                let names: Vec<String> = columns.iter().map(|c| c.value.clone()).collect();
                scope.tables.add_using(&label, table_schema, &names)
            }
            Some(JoinConstraint::None) => {
                Err(SemanticError::MissingJoinCondition { position: None })
            }
        }
    }

    fn add_join(&self, scope: &mut Scope, join: &Join, parent: Option<&Scope>) -> SemanticResult<()> {
        let constraint = match &join.join_operator {
            JoinOperator::Inner(c)
            | JoinOperator::LeftOuter(c)
            | JoinOperator::RightOuter(c)
            | JoinOperator::FullOuter(c) => c,
            JoinOperator::CrossJoin => {
                return self.add_table_factor(scope, &join.relation, parent, None);
            }
            other => {
                return Err(not_implemented(format!(
                    "join operator {:?}",
                    std::mem::discriminant(other)
                )))
            }
        };
        self.add_table_factor(scope, &join.relation, parent, Some(constraint))?;
        if let JoinConstraint::On(on_expr) = constraint {
            let ctx = ExprContext::new(Clause::JoinOn, false);
            let ty = self.check_expr(on_expr, scope, ctx)?;
            require_boolean(ty)?;
        }
        Ok(())
    }

    /// Schema and label of a single table factor
    fn table_factor_schema(
        &self,
        factor: &TableFactor,
        parent: Option<&Scope>,
    ) -> SemanticResult<(String, ResultSchema)> {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let table_name = name
                    .0
                    .last()
                    .map(|i| i.value.clone())
                    .unwrap_or_else(|| name.to_string());
                let table = self.schema.table(&table_name).ok_or_else(|| {
                    SemanticError::RelationNotFound {
                        name: table_name.clone(),
                        position: None,
                    }
                })?;
                let label = alias
                    .as_ref()
                    .map(|a| a.name.value.clone())
                    .unwrap_or_else(|| table_name.clone());
                Ok((label.clone(), ResultSchema::from_table(&label, table)))
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                let alias = alias
                    .as_ref()
                    .map(|a| a.name.value.clone())
                    .ok_or(SemanticError::MissingDerivedTableAlias { position: None })?;
                let inner = self.check_query(subquery, parent)?;
                for col in inner.attributes() {
                    if !is_plain_identifier(&col.name) {
                        return Err(SemanticError::MissingDerivedColumnAlias {
                            expression: col.name.clone(),
                            position: None,
                        });
                    }
                }
                Ok((alias.clone(), inner.re_keyed(&alias)))
            }
            other => Err(not_implemented(format!(
                "table factor {:?}",
                std::mem::discriminant(other)
            ))),
        }
    }

    // ---- ORDER BY ---------------------------------------------------------

    fn check_order_by(
        &self,
        exprs: &[OrderByExpr],
        scope: &Scope,
        output: &ResultSchema,
    ) -> SemanticResult<()> {
        for order_expr in exprs {
            self.check_order_by_expr(&order_expr.expr, scope, output)?;
        }
        Ok(())
    }

    fn check_order_by_expr(
        &self,
        expr: &Expr,
        scope: &Scope,
        output: &ResultSchema,
    ) -> SemanticResult<()> {
        // 1-based select-list ordinal
        if let Expr::Value(Value::Number(n, _)) = expr {
            let index: u64 = n.parse().unwrap_or(0);
            if index == 0 || index as usize > output.len() {
                return Err(SemanticError::OrderByPosition {
                    index,
                    max: output.len(),
                    position: None,
                });
            }
            return Ok(());
        }

        // a declared output name or the exact select-item expression
        if let Expr::Identifier(ident) = expr {
            if scope.projections.find_by_name(&ident.value).is_some()
                || output.contains_name(&ident.value)
            {
                return Ok(());
            }
        }
        if scope.projections.find_by_key(&expr.to_string()).is_some() {
            return Ok(());
        }

        if contains_aggregate(expr) {
            let ctx = ExprContext::new(Clause::OrderBy, false);
            self.check_expr(expr, scope, ctx)?;
            return Ok(());
        }

        if scope.is_grouped() {
            // non-aggregate expression under GROUP BY must come from the
            // select list
            return Err(SemanticError::OrderByExpressionNotInSelectList {
                expression: expr.to_string(),
                position: None,
            });
        }

        let ctx = ExprContext::new(Clause::OrderBy, false);
        self.check_expr(expr, scope, ctx)?;
        Ok(())
    }

    // ---- expressions ------------------------------------------------------

    fn check_expr(&self, expr: &Expr, scope: &Scope, ctx: ExprContext) -> SemanticResult<DataType> {
        // a grouped expression is usable as a unit wherever it appears
        if ctx.enforce_grouping && !ctx.in_aggregate {
            if let Some(group_scope) = &scope.group_by {
                if group_scope.contains_key(&expr.to_string()) {
                    return self.check_expr(expr, scope, ctx.without_grouping());
                }
            }
        }

        match expr {
            Expr::Identifier(ident) => {
                self.check_column(&Attribute::new(ident.value.clone()), scope, ctx)
            }
            Expr::CompoundIdentifier(parts) => {
                let attr = match parts.len() {
                    1 => Attribute::new(parts[0].value.clone()),
                    _ => Attribute::qualified(
                        parts[parts.len() - 2].value.clone(),
                        parts[parts.len() - 1].value.clone(),
                    ),
                };
                self.check_column(&attr, scope, ctx)
            }

            Expr::Value(value) => literal_type(value),

            Expr::BinaryOp { left, op, right } => self.check_binary_op(left, op, right, scope, ctx),

            Expr::UnaryOp { op, expr: inner } => {
                use sqlparser::ast::UnaryOperator;
                let ty = self.check_expr(inner, scope, ctx)?;
                match op {
                    UnaryOperator::Not => {
                        require_boolean(ty)?;
                        Ok(DataType::Boolean)
                    }
                    UnaryOperator::Minus | UnaryOperator::Plus => {
                        if ty.is_numeric() || matches!(ty, DataType::Null) {
                            Ok(ty)
                        } else {
                            Err(SemanticError::TypeMismatch {
                                left: ty,
                                right: DataType::Integer,
                                position: None,
                            })
                        }
                    }
                    other => Err(not_implemented(format!("unary operator {other}"))),
                }
            }

            Expr::Nested(inner) => self.check_expr(inner, scope, ctx),

            Expr::IsNull(inner) | Expr::IsNotNull(inner) => {
                self.check_expr(inner, scope, ctx)?;
                Ok(DataType::Boolean)
            }

            Expr::Between {
                expr: inner,
                low,
                high,
                ..
            } => {
                let ty = self.check_expr(inner, scope, ctx)?;
                for bound in [low, high] {
                    let bound_ty = self.check_expr(bound, scope, ctx)?;
                    if !ty.is_comparable_with(&bound_ty) {
                        return Err(SemanticError::TypeMismatch {
                            left: ty,
                            right: bound_ty,
                            position: None,
                        });
                    }
                }
                Ok(DataType::Boolean)
            }

            Expr::InList { expr: inner, list, .. } => {
                let ty = self.check_expr(inner, scope, ctx)?;
                for item in list {
                    let item_ty = self.check_expr(item, scope, ctx)?;
                    if !ty.is_comparable_with(&item_ty) {
                        return Err(SemanticError::TypeMismatch {
                            left: ty,
                            right: item_ty,
                            position: None,
                        });
                    }
                }
                Ok(DataType::Boolean)
            }

            Expr::Like {
                expr: inner,
                pattern,
                ..
            }
            | Expr::ILike {
                expr: inner,
                pattern,
                ..
            } => {
                let ty = self.check_expr(inner, scope, ctx)?;
                let pattern_ty = self.check_expr(pattern, scope, ctx)?;
                if !ty.is_string() && !matches!(ty, DataType::Null) {
                    return Err(SemanticError::TypeMismatch {
                        left: ty,
                        right: DataType::Varchar,
                        position: None,
                    });
                }
                if !pattern_ty.is_string() && !matches!(pattern_ty, DataType::Null) {
                    return Err(SemanticError::TypeMismatch {
                        left: pattern_ty,
                        right: DataType::Varchar,
                        position: None,
                    });
                }
                Ok(DataType::Boolean)
            }

            Expr::Cast {
                expr: inner,
                data_type,
                ..
            } => {
                let source = self.check_expr(inner, scope, ctx)?;
                let target = DataType::parse(&data_type.to_string())
                    .ok_or_else(|| not_implemented(format!("CAST target type {data_type}")))?;
                if !source.can_cast_to(&target) {
                    return Err(SemanticError::InvalidCast {
                        from: source,
                        to: target,
                        position: None,
                    });
                }
                Ok(target)
            }

            Expr::Function(func) => self.check_function(func, scope, ctx),

            Expr::Exists { subquery, .. } => {
                self.check_query(subquery, Some(scope))?;
                Ok(DataType::Boolean)
            }

            Expr::InSubquery {
                expr: inner,
                subquery,
                ..
            } => {
                let sub_out = self.check_query(subquery, Some(scope))?;
                if sub_out.len() != 1 {
                    return Err(SemanticError::ScalarSubqueryExpected {
                        detail: format!(
                            "IN subquery must select exactly one column, it selects {}",
                            sub_out.len()
                        ),
                        position: None,
                    });
                }
                let ty = self.check_expr(inner, scope, ctx)?;
                let sub_ty = sub_out.attributes()[0].data_type;
                if !ty.is_comparable_with(&sub_ty) {
                    return Err(SemanticError::TypeMismatch {
                        left: ty,
                        right: sub_ty,
                        position: None,
                    });
                }
                Ok(DataType::Boolean)
            }

            Expr::Subquery(subquery) => {
                let sub_out = self.check_query(subquery, Some(scope))?;
                if sub_out.len() != 1 {
                    return Err(SemanticError::ScalarSubqueryExpected {
                        detail: format!(
                            "scalar subquery must select exactly one column, it selects {}",
                            sub_out.len()
                        ),
                        position: None,
                    });
                }
                if !is_scalar_shaped(subquery) {
                    return Err(SemanticError::ScalarSubqueryExpected {
                        detail: "scalar subquery must select a single aggregated value"
                            .to_string(),
                        position: None,
                    });
                }
                Ok(sub_out.attributes()[0].data_type)
            }

            Expr::AnyOp {
                left,
                compare_op,
                right,
                ..
            } => self.check_quantified(left, compare_op, right, scope, ctx),
            Expr::AllOp {
                left,
                compare_op,
                right,
                ..
            } => self.check_quantified(left, compare_op, right, scope, ctx),

            other => Err(not_implemented(format!("expression {other}"))),
        }
    }

    fn check_column(
        &self,
        attr: &Attribute,
        scope: &Scope,
        ctx: ExprContext,
    ) -> SemanticResult<DataType> {
        let ty = match scope.resolve(attr) {
            Resolution::Unique(resolved) => resolved.attribute.data_type,
            Resolution::NotFound => {
                return Err(SemanticError::AttributeNotFound {
                    name: attr.to_string(),
                    position: None,
                })
            }
            Resolution::Ambiguous(relations) => {
                return Err(SemanticError::AmbiguousAttributeReference {
                    name: attr.name.clone(),
                    relations,
                    position: None,
                })
            }
        };
        if ctx.enforce_grouping && !ctx.in_aggregate {
            if let Some(group_scope) = &scope.group_by {
                if !group_scope.contains_name(&attr.name) {
                    return Err(SemanticError::UngroupedColumn {
                        column: attr.to_string(),
                        position: None,
                    });
                }
            }
        }
        Ok(ty)
    }

    fn check_binary_op(
        &self,
        left: &Expr,
        op: &sqlparser::ast::BinaryOperator,
        right: &Expr,
        scope: &Scope,
        ctx: ExprContext,
    ) -> SemanticResult<DataType> {
        use sqlparser::ast::BinaryOperator as Op;
        let left_ty = self.check_expr(left, scope, ctx)?;
        let right_ty = self.check_expr(right, scope, ctx)?;
        match op {
            Op::Eq | Op::NotEq | Op::Lt | Op::LtEq | Op::Gt | Op::GtEq => {
                if !left_ty.is_comparable_with(&right_ty) {
                    return Err(SemanticError::TypeMismatch {
                        left: left_ty,
                        right: right_ty,
                        position: None,
                    });
                }
                Ok(DataType::Boolean)
            }
            Op::And | Op::Or => {
                require_boolean(left_ty)?;
                require_boolean(right_ty)?;
                Ok(DataType::Boolean)
            }
            Op::Plus | Op::Minus | Op::Multiply | Op::Divide | Op::Modulo => {
                for ty in [left_ty, right_ty] {
                    if !ty.is_numeric() && !matches!(ty, DataType::Null) {
                        return Err(SemanticError::TypeMismatch {
                            left: left_ty,
                            right: right_ty,
                            position: None,
                        });
                    }
                }
                Ok(left_ty.dominant_with(&right_ty))
            }
            Op::StringConcat => {
                for ty in [left_ty, right_ty] {
                    if !ty.is_string() && !matches!(ty, DataType::Null) {
                        return Err(SemanticError::TypeMismatch {
                            left: left_ty,
                            right: right_ty,
                            position: None,
                        });
                    }
                }
                Ok(DataType::Varchar)
            }
            other => Err(not_implemented(format!("binary operator {other}"))),
        }
    }

    fn check_quantified(
        &self,
        left: &Expr,
        compare_op: &sqlparser::ast::BinaryOperator,
        right: &Expr,
        scope: &Scope,
        ctx: ExprContext,
    ) -> SemanticResult<DataType> {
        use sqlparser::ast::BinaryOperator as Op;
        if !matches!(
            compare_op,
            Op::Eq | Op::NotEq | Op::Lt | Op::LtEq | Op::Gt | Op::GtEq
        ) {
            return Err(not_implemented(format!(
                "quantified comparison with {compare_op}"
            )));
        }
        let Expr::Subquery(subquery) = right else {
            return Err(not_implemented("quantified comparison without a subquery"));
        };
        let sub_out = self.check_query(subquery, Some(scope))?;
        if sub_out.len() != 1 {
            return Err(SemanticError::ScalarSubqueryExpected {
                detail: format!(
                    "quantified subquery must select exactly one column, it selects {}",
                    sub_out.len()
                ),
                position: None,
            });
        }
        let left_ty = self.check_expr(left, scope, ctx)?;
        let sub_ty = sub_out.attributes()[0].data_type;
        if !left_ty.is_comparable_with(&sub_ty) {
            return Err(SemanticError::TypeMismatch {
                left: left_ty,
                right: sub_ty,
                position: None,
            });
        }
        Ok(DataType::Boolean)
    }

    fn check_function(
        &self,
        func: &sqlparser::ast::Function,
        scope: &Scope,
        ctx: ExprContext,
    ) -> SemanticResult<DataType> {
        let name = func.name.to_string().to_uppercase();
        if !is_aggregate_function(&name) {
            return Err(not_implemented(format!("function {name}")));
        }
        if ctx.clause == Clause::Where {
            return Err(SemanticError::AggregateInWhere {
                function: name,
                position: None,
            });
        }
        if ctx.in_aggregate {
            return Err(SemanticError::NestedAggregate {
                function: name,
                position: None,
            });
        }

        let list = match &func.args {
            FunctionArguments::List(list) => list,
            _ => return Err(not_implemented(format!("{name} without an argument list"))),
        };
        if list.args.len() != 1 {
            return Err(not_implemented(format!(
                "{name} with {} arguments",
                list.args.len()
            )));
        }
        match &list.args[0] {
            FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => {
                if name == "COUNT" {
                    Ok(DataType::Integer)
                } else {
                    Err(SemanticError::InvalidFunctionArgument {
                        function: name,
                        attribute: "*".to_string(),
                        data_type: DataType::Null,
                        position: None,
                    })
                }
            }
            FunctionArg::Unnamed(FunctionArgExpr::Expr(arg)) => {
                let arg_ty = self.check_expr(arg, scope, ctx.inside_aggregate())?;
                if matches!(name.as_str(), "SUM" | "AVG")
                    && !arg_ty.is_numeric()
                    && !matches!(arg_ty, DataType::Null)
                {
                    return Err(SemanticError::InvalidFunctionArgument {
                        function: name,
                        attribute: arg.to_string(),
                        data_type: arg_ty,
                        position: None,
                    });
                }
                Ok(aggregate_result_type(&name, arg_ty))
            }
            other => Err(not_implemented(format!("aggregate argument {other}"))),
        }
    }
}

/// Result type of an aggregate call
fn aggregate_result_type(name: &str, input: DataType) -> DataType {
    match name {
        "COUNT" => DataType::Integer,
        "SUM" | "AVG" => {
            if input.is_numeric() {
                input
            } else {
                DataType::Float
            }
        }
        _ => input,
    }
}

/// The five aggregation functions of the teaching subset
pub(crate) fn is_aggregate_function(name: &str) -> bool {
    matches!(name, "COUNT" | "SUM" | "AVG" | "MIN" | "MAX")
}

/// Whether an expression contains an aggregate call
pub(crate) fn contains_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Function(f) => is_aggregate_function(&f.name.to_string().to_uppercase()),
        Expr::BinaryOp { left, right, .. } => contains_aggregate(left) || contains_aggregate(right),
        Expr::UnaryOp { expr, .. } => contains_aggregate(expr),
        Expr::Nested(inner) => contains_aggregate(inner),
        Expr::Cast { expr, .. } => contains_aggregate(expr),
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => contains_aggregate(inner),
        Expr::Between {
            expr, low, high, ..
        } => contains_aggregate(expr) || contains_aggregate(low) || contains_aggregate(high),
        _ => false,
    }
}

/// A scalar subquery must be a single aggregate-backed SELECT item with no
/// grouping, which guarantees exactly one row
fn is_scalar_shaped(query: &Query) -> bool {
    let SetExpr::Select(select) = query.body.as_ref() else {
        return false;
    };
    if select.projection.len() != 1 {
        return false;
    }
    let grouped = matches!(
        &select.group_by,
        GroupByExpr::Expressions(exprs, _) if !exprs.is_empty()
    );
    if grouped {
        return false;
    }
    match &select.projection[0] {
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
            contains_aggregate(expr)
        }
        _ => false,
    }
}

fn require_boolean(ty: DataType) -> SemanticResult<()> {
    if matches!(ty, DataType::Boolean | DataType::Null) {
        Ok(())
    } else {
        Err(SemanticError::TypeMismatch {
            left: ty,
            right: DataType::Boolean,
            position: None,
        })
    }
}

/// Type of a literal value
fn literal_type(value: &Value) -> SemanticResult<DataType> {
    match value {
        Value::Number(n, _) => {
            if n.contains('.') || n.contains('e') || n.contains('E') {
                Ok(DataType::Float)
            } else {
                Ok(DataType::Integer)
            }
        }
        Value::SingleQuotedString(_) | Value::DoubleQuotedString(_) => Ok(DataType::Varchar),
        Value::Boolean(_) => Ok(DataType::Boolean),
        Value::Null => Ok(DataType::Null),
        other => Err(not_implemented(format!("literal {other}"))),
    }
}

/// Output name a bare select item contributes, when one can be inferred
fn infer_item_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.clone()),
        Expr::Function(f) => Some(f.name.to_string().to_lowercase()),
        _ => None,
    }
}

/// Unqualified column name of a plain column expression
fn column_name_of(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.clone()),
        _ => None,
    }
}

/// Whether a derived-table output name is usable as a column identifier
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
