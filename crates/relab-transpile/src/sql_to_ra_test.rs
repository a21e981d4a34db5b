use super::*;
use relab_core::{DataType, TableSchema};
use relab_ra::RaKind;
use relab_sql::SqlParser;

fn schema() -> RelationalSchema {
    RelationalSchema::new()
        .with_table(
            "products",
            TableSchema::new([
                ("product_id", DataType::Integer),
                ("name", DataType::Varchar),
                ("price", DataType::Decimal),
            ]),
        )
        .with_table(
            "orders",
            TableSchema::new([
                ("order_id", DataType::Integer),
                ("product_id", DataType::Integer),
                ("customer_id", DataType::Integer),
            ]),
        )
}

fn ra_of(sql: &str) -> RaExpression {
    let query = SqlParser::new().parse_query(sql).expect("test SQL must parse");
    sql_to_ra(&query, &schema()).expect("transpilation failed")
}

fn err_of(sql: &str) -> TranspileError {
    let query = SqlParser::new().parse_query(sql).expect("test SQL must parse");
    sql_to_ra(&query, &schema()).expect_err("expected transpilation failure")
}

#[test]
fn test_select_star() {
    assert_eq!(ra_of("SELECT * FROM products"), RaExpression::relation("products"));
}

#[test]
fn test_projection_and_selection() {
    let expected = RaExpression::relation("products")
        .select(BooleanExpression::compare_literal(
            Attribute::new("price"),
            ComparisonOp::Gt,
            Literal::Integer(10),
        ))
        .project(vec![Attribute::new("name")]);
    assert_eq!(ra_of("SELECT name FROM products WHERE price > 10"), expected);
}

#[test]
fn test_natural_join() {
    assert_eq!(
        ra_of("SELECT * FROM products NATURAL JOIN orders"),
        RaExpression::relation("products").natural_join(RaExpression::relation("orders"))
    );
}

#[test]
fn test_using_join_covering_shared_columns() {
    assert_eq!(
        ra_of("SELECT * FROM products JOIN orders USING (product_id)"),
        RaExpression::relation("products").natural_join(RaExpression::relation("orders"))
    );
}

#[test]
fn test_on_join_becomes_theta_join() {
    let expected = RaExpression::relation("orders").rename("o").theta_join(
        RaExpression::relation("products").rename("p"),
        BooleanExpression::compare_attributes(
            Attribute::qualified("o", "product_id"),
            ComparisonOp::Eq,
            Attribute::qualified("p", "product_id"),
        ),
    );
    assert_eq!(
        ra_of("SELECT * FROM orders o JOIN products p ON o.product_id = p.product_id"),
        expected
    );
}

#[test]
fn test_cross_join() {
    assert_eq!(
        ra_of("SELECT * FROM products CROSS JOIN orders"),
        RaExpression::relation("products").cartesian(RaExpression::relation("orders"))
    );
    assert_eq!(
        ra_of("SELECT * FROM products, orders"),
        RaExpression::relation("products").cartesian(RaExpression::relation("orders"))
    );
}

#[test]
fn test_correlated_exists_becomes_semi_join() {
    // the concrete scenario: a correlated EXISTS is a semi join
    assert_eq!(
        ra_of(
            "SELECT * FROM products WHERE EXISTS \
             (SELECT 1 FROM orders WHERE orders.product_id = products.product_id)"
        ),
        RaExpression::relation("products").semi_join(RaExpression::relation("orders"))
    );
}

#[test]
fn test_not_exists_becomes_anti_join() {
    assert_eq!(
        ra_of(
            "SELECT * FROM products WHERE NOT EXISTS \
             (SELECT 1 FROM orders WHERE orders.product_id = products.product_id)"
        ),
        RaExpression::relation("products").anti_join(RaExpression::relation("orders"))
    );
}

#[test]
fn test_in_subquery_normalizes_to_semi_join() {
    assert_eq!(
        ra_of("SELECT * FROM products WHERE product_id IN (SELECT product_id FROM orders)"),
        RaExpression::relation("products").semi_join(RaExpression::relation("orders"))
    );
    assert_eq!(
        ra_of("SELECT * FROM products WHERE product_id NOT IN (SELECT product_id FROM orders)"),
        RaExpression::relation("products").anti_join(RaExpression::relation("orders"))
    );
}

#[test]
fn test_exists_with_local_predicate() {
    let mut with_quantity = schema();
    with_quantity.insert(
        "orders",
        TableSchema::new([
            ("order_id", DataType::Integer),
            ("product_id", DataType::Integer),
            ("quantity", DataType::Integer),
        ]),
    );
    let expected = RaExpression::relation("products").semi_join(
        RaExpression::relation("orders").select(BooleanExpression::compare_literal(
            Attribute::new("quantity"),
            ComparisonOp::Gt,
            Literal::Integer(2),
        )),
    );
    let query = SqlParser::new()
        .parse_query(
            "SELECT * FROM products WHERE EXISTS (SELECT 1 FROM orders \
             WHERE orders.product_id = products.product_id AND quantity > 2)",
        )
        .unwrap();
    assert_eq!(sql_to_ra(&query, &with_quantity).unwrap(), expected);
}

#[test]
fn test_exists_projected_onto_parameters_when_names_overlap() {
    // products and suppliers share both product_id and name, but the
    // subquery correlates on product_id alone, so it is projected onto
    // that parameter before the join
    let mut with_suppliers = schema();
    with_suppliers.insert(
        "suppliers",
        TableSchema::new([
            ("product_id", DataType::Integer),
            ("name", DataType::Varchar),
        ]),
    );
    let expected = RaExpression::relation("products").semi_join(
        RaExpression::relation("suppliers").project(vec![Attribute::new("product_id")]),
    );
    let query = SqlParser::new()
        .parse_query(
            "SELECT * FROM products WHERE EXISTS (SELECT 1 FROM suppliers \
             WHERE suppliers.product_id = products.product_id)",
        )
        .unwrap();
    assert_eq!(sql_to_ra(&query, &with_suppliers).unwrap(), expected);
}

#[test]
fn test_exists_and_plain_predicate() {
    let expected = RaExpression::relation("products")
        .semi_join(RaExpression::relation("orders"))
        .select(BooleanExpression::compare_literal(
            Attribute::new("price"),
            ComparisonOp::Lt,
            Literal::Integer(100),
        ));
    assert_eq!(
        ra_of(
            "SELECT * FROM products WHERE price < 100 AND EXISTS \
             (SELECT 1 FROM orders WHERE orders.product_id = products.product_id)"
        ),
        expected
    );
}

#[test]
fn test_group_by_with_aggregates() {
    let expected = RaExpression::relation("orders").aggregate(
        vec![Attribute::new("customer_id")],
        vec![Aggregation::new(
            Attribute::new("order_id"),
            AggregateFunction::Count,
            "n",
        )],
    );
    assert_eq!(
        ra_of("SELECT customer_id, COUNT(order_id) AS n FROM orders GROUP BY customer_id"),
        expected
    );
}

#[test]
fn test_global_aggregate() {
    let expected = RaExpression::relation("products").aggregate(
        vec![],
        vec![Aggregation::new(
            Attribute::new("price"),
            AggregateFunction::Max,
            "max",
        )],
    );
    assert_eq!(ra_of("SELECT MAX(price) FROM products"), expected);
}

#[test]
fn test_count_star_uses_group_attribute() {
    let expected = RaExpression::relation("orders").aggregate(
        vec![Attribute::new("customer_id")],
        vec![Aggregation::new(
            Attribute::new("customer_id"),
            AggregateFunction::Count,
            "n",
        )],
    );
    assert_eq!(
        ra_of("SELECT customer_id, COUNT(*) AS n FROM orders GROUP BY customer_id"),
        expected
    );
}

#[test]
fn test_having_filters_aggregation_output() {
    let expected = RaExpression::relation("orders")
        .aggregate(
            vec![Attribute::new("customer_id")],
            vec![Aggregation::new(
                Attribute::new("order_id"),
                AggregateFunction::Count,
                "n",
            )],
        )
        .select(BooleanExpression::compare_literal(
            Attribute::new("n"),
            ComparisonOp::Gt,
            Literal::Integer(2),
        ));
    assert_eq!(
        ra_of(
            "SELECT customer_id, COUNT(order_id) AS n FROM orders \
             GROUP BY customer_id HAVING COUNT(order_id) > 2"
        ),
        expected
    );
}

#[test]
fn test_order_by_limit_becomes_top_n() {
    assert_eq!(
        ra_of("SELECT * FROM products ORDER BY price DESC LIMIT 3"),
        RaExpression::relation("products").top_n(3, Attribute::new("price"))
    );
}

#[test]
fn test_set_operations() {
    let expected = RaExpression::relation("products")
        .project(vec![Attribute::new("product_id")])
        .union(RaExpression::relation("orders").project(vec![Attribute::new("product_id")]));
    assert_eq!(
        ra_of("SELECT product_id FROM products UNION SELECT product_id FROM orders"),
        expected
    );
}

#[test]
fn test_derived_table_becomes_rename() {
    let expected = RaExpression::relation("orders")
        .project(vec![Attribute::new("product_id")])
        .rename("d")
        .project(vec![Attribute::qualified("d", "product_id")]);
    assert_eq!(
        ra_of("SELECT d.product_id FROM (SELECT product_id FROM orders) AS d"),
        expected
    );
}

#[test]
fn test_table_alias_becomes_rename() {
    assert_eq!(
        ra_of("SELECT p.name FROM products p").kind,
        RaExpression::relation("products")
            .rename("p")
            .project(vec![Attribute::qualified("p", "name")])
            .kind
    );
}

// ---- documented limitations ----------------------------------------------

#[test]
fn test_subquery_under_or_is_unsupported() {
    assert!(matches!(
        err_of(
            "SELECT * FROM products WHERE price > 10 OR EXISTS \
             (SELECT 1 FROM orders WHERE orders.product_id = products.product_id)"
        ),
        TranspileError::UnsupportedQuery { .. }
    ));
}

#[test]
fn test_uncorrelated_exists_is_unsupported() {
    assert!(matches!(
        err_of("SELECT * FROM products WHERE EXISTS (SELECT 1 FROM orders)"),
        TranspileError::UnsupportedQuery { .. }
    ));
}

#[test]
fn test_column_rename_is_unsupported() {
    assert!(matches!(
        err_of("SELECT name AS product_name FROM products"),
        TranspileError::UnsupportedQuery { .. }
    ));
}

#[test]
fn test_invalid_sql_reports_semantic_error() {
    assert!(matches!(
        err_of("SELECT zzz FROM products"),
        TranspileError::Semantic(_)
    ));
}

#[test]
fn test_ra_kind_shapes() {
    // spot-check the operator kinds, not just equality
    assert!(matches!(
        ra_of("SELECT * FROM products NATURAL JOIN orders").kind,
        RaKind::Join { .. }
    ));
    assert!(matches!(
        ra_of("SELECT * FROM products ORDER BY price DESC LIMIT 1").kind,
        RaKind::TopN { limit: 1, .. }
    ));
}
