//! Semantic validation of RA trees
//!
//! Bottom-up traversal: operands are validated before the operator itself,
//! so errors surface at the smallest failing subexpression. Stops at the
//! first error.

use crate::infer::{resolve_or_error, SchemaInferrer};
use relab_core::{
    DataType, RelationalSchema, ResultSchema, SemanticError, SemanticResult,
};
use relab_ra::{
    AggregateFunction, BoolKind, BooleanExpression, Literal, Operand, RaExpression, RaKind,
    SetOpKind,
};

/// Validate an RA expression against a schema.
///
/// Returns the first semantic error found, or `Ok(())`.
pub fn validate(expr: &RaExpression, schema: &RelationalSchema) -> SemanticResult<()> {
    let mut inferrer = SchemaInferrer::new(schema);
    validate_with(expr, &mut inferrer)
}

/// Validate using a caller-supplied inferrer (shares the memo cache with
/// other passes over the same tree)
pub fn validate_with<'a>(
    expr: &'a RaExpression,
    inferrer: &mut SchemaInferrer<'a>,
) -> SemanticResult<()> {
    for child in expr.children() {
        validate_with(child, inferrer)?;
    }
    validate_node(expr, inferrer)
}

fn validate_node<'a>(
    expr: &'a RaExpression,
    inferrer: &mut SchemaInferrer<'a>,
) -> SemanticResult<()> {
    match &expr.kind {
        // Inference itself performs the checks these operators need:
        // relation existence and attribute resolution.
        RaKind::Relation { .. } | RaKind::Projection { .. } | RaKind::Rename { .. } => {
            inferrer.infer(expr)?;
            Ok(())
        }

        RaKind::Selection { condition, input } => {
            let input_schema = inferrer.infer(input)?;
            validate_condition(condition, &input_schema)
        }

        RaKind::SetOperation { kind, left, right } => {
            if matches!(kind, SetOpKind::Cartesian) {
                return Ok(());
            }
            let left_schema = inferrer.infer(left)?;
            let right_schema = inferrer.infer(right)?;
            check_union_compatible(&left_schema, &right_schema, expr)
        }

        RaKind::Join { left, right, .. } => {
            let left_schema = inferrer.infer(left)?;
            let right_schema = inferrer.infer(right)?;
            for name in ResultSchema::shared_names(&left_schema, &right_schema) {
                let lt = left_schema.find_name(&name).expect("shared name on left");
                let rt = right_schema.find_name(&name).expect("shared name on right");
                if !lt.data_type.is_comparable_with(&rt.data_type) {
                    return Err(SemanticError::JoinAttributeTypeMismatch {
                        attribute: name,
                        left: lt.data_type,
                        right: rt.data_type,
                        position: expr.position,
                    });
                }
            }
            Ok(())
        }

        RaKind::ThetaJoin {
            condition,
            left,
            right,
        } => {
            let left_schema = inferrer.infer(left)?;
            let right_schema = inferrer.infer(right)?;
            let merged = ResultSchema::merge_cartesian(&left_schema, &right_schema);
            validate_condition(condition, &merged)
        }

        RaKind::Division { dividend, divisor } => {
            let dividend_schema = inferrer.infer(dividend)?;
            let divisor_schema = inferrer.infer(divisor)?;
            for attr in divisor_schema.attributes() {
                match dividend_schema.find_name(&attr.name) {
                    None => {
                        return Err(SemanticError::DivisionSchemaCompatibility {
                            attribute: attr.name.clone(),
                            position: expr.position,
                        })
                    }
                    Some(d) => {
                        if !d.data_type.is_comparable_with(&attr.data_type) {
                            return Err(SemanticError::DivisionAttributeTypeMismatch {
                                attribute: attr.name.clone(),
                                left: d.data_type,
                                right: attr.data_type,
                                position: expr.position,
                            });
                        }
                    }
                }
            }
            Ok(())
        }

        RaKind::GroupedAggregation {
            aggregations,
            input,
            ..
        } => {
            // group-by and input attribute resolution happens in inference
            let input_schema = inferrer.infer(input)?;
            for agg in aggregations {
                let resolved = resolve_or_error(&input_schema, &agg.input, expr.position)?;
                let input_type = resolved.attribute.data_type;
                let numeric_required = matches!(
                    agg.function,
                    AggregateFunction::Sum | AggregateFunction::Avg
                );
                if numeric_required
                    && !input_type.is_numeric()
                    && !matches!(input_type, DataType::Null)
                {
                    return Err(SemanticError::InvalidFunctionArgument {
                        function: agg.function.sql_name().to_string(),
                        attribute: agg.input.to_string(),
                        data_type: input_type,
                        position: expr.position,
                    });
                }
            }
            inferrer.infer(expr)?;
            Ok(())
        }

        RaKind::TopN {
            attribute, input, ..
        } => {
            let input_schema = inferrer.infer(input)?;
            resolve_or_error(&input_schema, attribute, expr.position)?;
            Ok(())
        }
    }
}

fn check_union_compatible(
    left: &ResultSchema,
    right: &ResultSchema,
    expr: &RaExpression,
) -> SemanticResult<()> {
    if left.len() != right.len() {
        return Err(SemanticError::UnionCompatibility {
            detail: format!(
                "left side has {} attributes, right side has {}",
                left.len(),
                right.len()
            ),
            position: expr.position,
        });
    }
    for (i, (l, r)) in left
        .attributes()
        .iter()
        .zip(right.attributes())
        .enumerate()
    {
        if !l.data_type.is_comparable_with(&r.data_type) {
            return Err(SemanticError::UnionCompatibility {
                detail: format!(
                    "attribute {} has type {} on the left but {} on the right",
                    i + 1,
                    l.data_type,
                    r.data_type
                ),
                position: expr.position,
            });
        }
    }
    Ok(())
}

/// Validate a boolean condition against the schema it ranges over
pub(crate) fn validate_condition(
    condition: &BooleanExpression,
    schema: &ResultSchema,
) -> SemanticResult<()> {
    match &condition.kind {
        BoolKind::And { left, right } | BoolKind::Or { left, right } => {
            validate_condition(left, schema)?;
            validate_condition(right, schema)
        }
        BoolKind::Not { operand } => validate_condition(operand, schema),
        BoolKind::Comparison { left, right, .. } => {
            let left_type = operand_type(left, schema, condition)?;
            let right_type = operand_type(right, schema, condition)?;
            if !left_type.is_comparable_with(&right_type) {
                return Err(SemanticError::TypeMismatch {
                    left: left_type,
                    right: right_type,
                    position: condition.position,
                });
            }
            Ok(())
        }
    }
}

fn operand_type(
    operand: &Operand,
    schema: &ResultSchema,
    condition: &BooleanExpression,
) -> SemanticResult<DataType> {
    match operand {
        Operand::Attribute(attr) => {
            let resolved = resolve_or_error(schema, attr, condition.position)?;
            Ok(resolved.attribute.data_type)
        }
        Operand::Literal(lit) => Ok(literal_type(lit)),
    }
}

fn literal_type(literal: &Literal) -> DataType {
    match literal {
        Literal::String(_) => DataType::Varchar,
        Literal::Integer(_) => DataType::Integer,
        Literal::Float(_) => DataType::Float,
        Literal::Boolean(_) => DataType::Boolean,
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
