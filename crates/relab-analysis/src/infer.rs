//! Output-schema inference for RA operator trees
//!
//! One inferrer instance serves one validation/transpilation call; its memo
//! cache is keyed by node identity and discarded with the call. The
//! lifetime parameter ties cached entries to the borrowed tree, so a cache
//! key can never outlive the node it denotes.

use relab_core::{
    Attribute, DataType, RelationalSchema, Resolution, ResultSchema, SemanticError,
    SemanticResult, TypedAttribute,
};
use relab_ra::{AggregateFunction, RaExpression, RaKind, SetOpKind};
use std::collections::HashMap;

/// Schema inferrer over RA expressions, memoized per node identity
pub struct SchemaInferrer<'a> {
    schema: &'a RelationalSchema,
    cache: HashMap<usize, ResultSchema>,
}

impl<'a> SchemaInferrer<'a> {
    /// Create an inferrer over one schema snapshot
    pub fn new(schema: &'a RelationalSchema) -> Self {
        Self {
            schema,
            cache: HashMap::new(),
        }
    }

    /// The schema snapshot this inferrer reads
    pub fn schema(&self) -> &'a RelationalSchema {
        self.schema
    }

    /// Infer the output schema of a node. A node visited twice (the tree
    /// builder re-walks shared subtrees) is computed once.
    pub fn infer(&mut self, expr: &'a RaExpression) -> SemanticResult<ResultSchema> {
        let key = expr as *const RaExpression as usize;
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        let result = self.infer_node(expr)?;
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    fn infer_node(&mut self, expr: &'a RaExpression) -> SemanticResult<ResultSchema> {
        match &expr.kind {
            RaKind::Relation { name } => match self.schema.table(name) {
                Some(table) => Ok(ResultSchema::from_table(name, table)),
                None => Err(SemanticError::RelationNotFound {
                    name: name.clone(),
                    position: expr.position,
                }),
            },

            RaKind::Projection { attributes, input } => {
                let input_schema = self.infer(input)?;
                let mut groups: Vec<(Option<String>, Vec<TypedAttribute>)> = Vec::new();
                let mut positional = Vec::new();
                for attr in attributes {
                    let resolved =
                        resolve_or_error(&input_schema, attr, expr.position)?;
                    let key = resolved.relation.map(str::to_string);
                    let typed = resolved.attribute.clone();
                    positional.push(typed.clone());
                    match groups.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, cols)) => {
                            if !cols.iter().any(|c| c.name.eq_ignore_ascii_case(&typed.name)) {
                                cols.push(typed);
                            }
                        }
                        None => groups.push((key, vec![typed])),
                    }
                }
                Ok(ResultSchema::with_attributes(groups, positional))
            }

            RaKind::Selection { input, .. } => self.infer(input),

            RaKind::Rename { alias, input } => {
                let input_schema = self.infer(input)?;
                Ok(input_schema.re_keyed(alias))
            }

            RaKind::SetOperation { kind, left, right } => {
                let left_schema = self.infer(left)?;
                let right_schema = self.infer(right)?;
                match kind {
                    SetOpKind::Cartesian => {
                        Ok(ResultSchema::merge_cartesian(&left_schema, &right_schema))
                    }
                    // A set-operation result has no stable table identity;
                    // compatibility is the validator's concern.
                    _ => Ok(ResultSchema::under_key(
                        None,
                        left_schema.attributes().to_vec(),
                    )),
                }
            }

            RaKind::Join { left, right, .. } => {
                let left_schema = self.infer(left)?;
                let right_schema = self.infer(right)?;
                Ok(ResultSchema::merge_natural(&left_schema, &right_schema))
            }

            RaKind::ThetaJoin { left, right, .. } => {
                let left_schema = self.infer(left)?;
                let right_schema = self.infer(right)?;
                Ok(ResultSchema::merge_cartesian(&left_schema, &right_schema))
            }

            RaKind::Division { dividend, divisor } => {
                let dividend_schema = self.infer(dividend)?;
                let divisor_schema = self.infer(divisor)?;
                let quotient: Vec<TypedAttribute> = dividend_schema
                    .attributes()
                    .iter()
                    .filter(|a| !divisor_schema.contains_name(&a.name))
                    .cloned()
                    .collect();
                Ok(ResultSchema::under_key(None, quotient))
            }

            RaKind::GroupedAggregation {
                group_by,
                aggregations,
                input,
            } => {
                let input_schema = self.infer(input)?;
                let mut out = Vec::new();
                for attr in group_by {
                    let resolved =
                        resolve_or_error(&input_schema, attr, expr.position)?;
                    out.push(TypedAttribute::new(
                        attr.name.clone(),
                        resolved.attribute.data_type,
                    ));
                }
                for agg in aggregations {
                    let resolved =
                        resolve_or_error(&input_schema, &agg.input, expr.position)?;
                    let output_type =
                        aggregate_output_type(agg.function, resolved.attribute.data_type);
                    out.push(TypedAttribute::new(agg.output.clone(), output_type));
                }
                Ok(ResultSchema::under_key(None, out))
            }

            RaKind::TopN { input, .. } => self.infer(input),
        }
    }
}

/// Translate the three-way resolution outcome into validator errors
pub(crate) fn resolve_or_error<'s>(
    schema: &'s ResultSchema,
    attr: &Attribute,
    position: Option<relab_core::Position>,
) -> SemanticResult<relab_core::ResolvedAttribute<'s>> {
    match schema.resolve(attr) {
        Resolution::Unique(resolved) => Ok(resolved),
        Resolution::NotFound => Err(SemanticError::AttributeNotFound {
            name: attr.to_string(),
            position,
        }),
        Resolution::Ambiguous(relations) => Err(SemanticError::AmbiguousAttributeReference {
            name: attr.name.clone(),
            relations,
            position,
        }),
    }
}

/// Output type of an aggregation per the function type rules
pub(crate) fn aggregate_output_type(function: AggregateFunction, input: DataType) -> DataType {
    match function {
        AggregateFunction::Count => DataType::Integer,
        AggregateFunction::Sum | AggregateFunction::Avg => {
            if input.is_numeric() {
                input
            } else {
                // the legality check is the validator's; type as FLOAT here
                DataType::Float
            }
        }
        AggregateFunction::Min | AggregateFunction::Max => input,
    }
}

#[cfg(test)]
#[path = "infer_test.rs"]
mod tests;
