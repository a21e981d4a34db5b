use super::*;
use relab_core::{Attribute, TableSchema};
use relab_ra::{parse, Aggregation, ComparisonOp};

fn schema() -> RelationalSchema {
    RelationalSchema::new()
        .with_table(
            "R",
            TableSchema::new([("A", DataType::Integer), ("B", DataType::Varchar)]),
        )
        .with_table(
            "S",
            TableSchema::new([("B", DataType::Varchar), ("C", DataType::Date)]),
        )
        .with_table(
            "V",
            TableSchema::new([("B", DataType::Integer), ("D", DataType::Integer)]),
        )
}

fn check(source: &str) -> SemanticResult<()> {
    validate(&parse(source).expect("test query must parse"), &schema())
}

#[test]
fn test_valid_queries_pass() {
    assert!(check("R").is_ok());
    assert!(check("\\pi_{A, B} R").is_ok());
    assert!(check("\\sigma_{A > 5} R").is_ok());
    assert!(check("R \\bowtie S").is_ok());
    assert!(check("\\rho_{x} R").is_ok());
    assert!(check("T_{3, A} R").is_ok());
}

#[test]
fn test_relation_not_found() {
    assert!(matches!(
        check("Q"),
        Err(SemanticError::RelationNotFound { ref name, .. }) if name == "Q"
    ));
}

#[test]
fn test_error_surfaces_at_smallest_subexpression() {
    // the bad relation is nested; the error must be about it, not the join
    assert!(matches!(
        check("R \\bowtie \\sigma_{A = 1} Q"),
        Err(SemanticError::RelationNotFound { ref name, .. }) if name == "Q"
    ));
}

#[test]
fn test_selection_type_mismatch() {
    // B is VARCHAR, 5 is an integer literal
    assert!(matches!(
        check("\\sigma_{B = 5} R"),
        Err(SemanticError::TypeMismatch {
            left: DataType::Varchar,
            right: DataType::Integer,
            ..
        })
    ));
}

#[test]
fn test_selection_unknown_attribute() {
    assert!(matches!(
        check("\\sigma_{Z = 5} R"),
        Err(SemanticError::AttributeNotFound { .. })
    ));
}

#[test]
fn test_ambiguous_attribute_lists_relations() {
    match check("\\sigma_{B = 'x'} (R \\times S)") {
        Err(SemanticError::AmbiguousAttributeReference { name, relations, .. }) => {
            assert_eq!(name, "B");
            assert_eq!(relations, ["R", "S"]);
        }
        other => panic!("expected ambiguity error, got {other:?}"),
    }
}

#[test]
fn test_natural_join_merges_shared_attribute() {
    // B is folded under the unqualified key, so it is not ambiguous
    assert!(check("\\sigma_{B = 'x'} (R \\bowtie S)").is_ok());
}

#[test]
fn test_join_attribute_type_mismatch() {
    // R.B is VARCHAR, V.B is INTEGER
    assert!(matches!(
        check("R \\bowtie V"),
        Err(SemanticError::JoinAttributeTypeMismatch { ref attribute, .. }) if attribute == "B"
    ));
}

#[test]
fn test_union_compatibility_arity() {
    assert!(matches!(
        check("\\pi_{A} R \\cup S"),
        Err(SemanticError::UnionCompatibility { .. })
    ));
}

#[test]
fn test_union_compatibility_types() {
    // R: (INTEGER, VARCHAR) vs S: (VARCHAR, DATE)
    assert!(matches!(
        check("R \\cup S"),
        Err(SemanticError::UnionCompatibility { .. })
    ));
    // V: (INTEGER, INTEGER) against π_{A,A} R? same arity, comparable types
    assert!(check("\\pi_{A, A} R \\cup V").is_ok());
}

#[test]
fn test_division_schema_compatibility() {
    // divisor has D, absent from π_{A,B} R
    assert!(matches!(
        check("\\pi_{A, B} R \\div \\pi_{D} V"),
        Err(SemanticError::DivisionSchemaCompatibility { ref attribute, .. }) if attribute == "D"
    ));
}

#[test]
fn test_division_attribute_type_mismatch() {
    // shared name B: VARCHAR in R, INTEGER in V
    assert!(matches!(
        check("R \\div \\pi_{B} V"),
        Err(SemanticError::DivisionAttributeTypeMismatch { ref attribute, .. }) if attribute == "B"
    ));
}

#[test]
fn test_division_valid() {
    assert!(check("V \\div \\pi_{B} V").is_ok());
}

#[test]
fn test_aggregation_sum_requires_numeric() {
    assert!(matches!(
        check("\\Gamma_{(A), ((B, sum, total))} R"),
        Err(SemanticError::InvalidFunctionArgument { ref function, .. }) if function == "SUM"
    ));
    assert!(check("\\Gamma_{(B), ((A, sum, total))} R").is_ok());
    // COUNT and MIN/MAX accept any input type
    assert!(check("\\Gamma_{(A), ((B, count, n))} R").is_ok());
    assert!(check("\\Gamma_{(A), ((B, max, last))} R").is_ok());
}

#[test]
fn test_top_n_attribute_must_resolve() {
    assert!(matches!(
        check("T_{3, Z} R"),
        Err(SemanticError::AttributeNotFound { .. })
    ));
}

#[test]
fn test_theta_join_condition_checked_against_both_sides() {
    assert!(check("R \\overset{R.A = V.D}{\\bowtie} V").is_ok());
    assert!(matches!(
        check("R \\overset{R.B = V.D}{\\bowtie} V"),
        Err(SemanticError::TypeMismatch { .. })
    ));
}

#[test]
fn test_error_position_points_at_operator() {
    let expr = parse("R \\cup S").unwrap();
    let err = validate(&expr, &schema()).unwrap_err();
    let pos = err.position().expect("error should carry a position");
    assert_eq!(pos.line, 1);
    assert_eq!(pos.start_col, 3);
}

#[test]
fn test_combinator_built_tree_validates() {
    let q = RaExpression::relation("R")
        .select(BooleanExpression::compare_literal(
            Attribute::new("A"),
            ComparisonOp::Gt,
            relab_ra::Literal::Integer(1),
        ))
        .aggregate(
            vec![Attribute::new("B")],
            vec![Aggregation::new(
                Attribute::new("A"),
                AggregateFunction::Avg,
                "avg_a",
            )],
        );
    assert!(validate(&q, &schema()).is_ok());
}
