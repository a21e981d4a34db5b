//! LaTeX rendering of RA expressions — the inverse of the parser
//!
//! Two styles: compact (minimal spacing) and pretty (spaces after commas
//! and around comparison operators). Both satisfy `parse(latex(a)) == a`
//! for every tree whose string literals contain no quote characters.

use crate::ast::{
    BoolKind, BooleanExpression, ComparisonOp, JoinKind, Literal, Operand, RaExpression, RaKind,
    SetOpKind,
};
use relab_core::Attribute;

/// Rendering style options
#[derive(Debug, Clone, Copy)]
struct Style {
    pretty: bool,
}

impl Style {
    fn comma(&self) -> &'static str {
        if self.pretty {
            ", "
        } else {
            ","
        }
    }
}

/// Render an expression compactly
pub fn latex(expr: &RaExpression) -> String {
    let mut out = String::new();
    render_expr(expr, &Style { pretty: false }, &mut out);
    out
}

/// Render an expression with breathing room
pub fn latex_pretty(expr: &RaExpression) -> String {
    let mut out = String::new();
    render_expr(expr, &Style { pretty: true }, &mut out);
    out
}

/// Render a boolean condition alone (pretty style), for display labels
pub fn latex_condition(condition: &BooleanExpression) -> String {
    let mut out = String::new();
    render_bool(condition, &Style { pretty: true }, 0, false, &mut out);
    out
}

fn is_binary(expr: &RaExpression) -> bool {
    matches!(
        expr.kind,
        RaKind::SetOperation { .. }
            | RaKind::Join { .. }
            | RaKind::ThetaJoin { .. }
            | RaKind::Division { .. }
    )
}

fn render_expr(expr: &RaExpression, style: &Style, out: &mut String) {
    match &expr.kind {
        RaKind::Relation { name } => out.push_str(name),

        RaKind::Projection { attributes, input } => {
            out.push_str("\\pi_{");
            render_attribute_list(attributes, style, out);
            out.push_str("} ");
            render_operand(input, style, out);
        }

        RaKind::Selection { condition, input } => {
            out.push_str("\\sigma_{");
            render_bool(condition, style, 0, false, out);
            out.push_str("} ");
            render_operand(input, style, out);
        }

        RaKind::Rename { alias, input } => {
            out.push_str("\\rho_{");
            out.push_str(alias);
            out.push_str("} ");
            render_operand(input, style, out);
        }

        RaKind::SetOperation { kind, left, right } => {
            let op = match kind {
                SetOpKind::Union => "\\cup",
                SetOpKind::Intersect => "\\cap",
                SetOpKind::Difference => "-",
                SetOpKind::Cartesian => "\\times",
            };
            render_binary(left, op, right, style, out);
        }

        RaKind::Join { kind, left, right } => {
            let op = match kind {
                JoinKind::Natural => "\\bowtie",
                JoinKind::Semi => "\\ltimes",
                JoinKind::Anti => "\\triangleright",
                JoinKind::Left => "\\leftouterjoin",
                JoinKind::Right => "\\rightouterjoin",
                JoinKind::Outer => "\\fullouterjoin",
            };
            render_binary(left, op, right, style, out);
        }

        RaKind::ThetaJoin {
            condition,
            left,
            right,
        } => {
            render_left(left, style, out);
            out.push_str(" \\overset{");
            render_bool(condition, style, 0, false, out);
            out.push_str("}{\\bowtie} ");
            render_right(right, style, out);
        }

        RaKind::Division { dividend, divisor } => {
            render_binary(dividend, "\\div", divisor, style, out);
        }

        RaKind::GroupedAggregation {
            group_by,
            aggregations,
            input,
        } => {
            out.push_str("\\Gamma_{(");
            render_attribute_list(group_by, style, out);
            out.push(')');
            out.push_str(style.comma());
            out.push('(');
            for (i, agg) in aggregations.iter().enumerate() {
                if i > 0 {
                    out.push_str(style.comma());
                }
                out.push('(');
                render_attribute(&agg.input, out);
                out.push_str(style.comma());
                out.push_str(agg.function.name());
                out.push_str(style.comma());
                out.push_str(&agg.output);
                out.push(')');
            }
            out.push_str(")} ");
            render_operand(input, style, out);
        }

        RaKind::TopN {
            limit,
            attribute,
            input,
        } => {
            out.push_str("T_{");
            out.push_str(&limit.to_string());
            out.push_str(style.comma());
            render_attribute(attribute, out);
            out.push_str("} ");
            render_operand(input, style, out);
        }
    }
}

/// Operand of a prefix operator: parenthesized when binary
fn render_operand(expr: &RaExpression, style: &Style, out: &mut String) {
    if is_binary(expr) {
        out.push('(');
        render_expr(expr, style, out);
        out.push(')');
    } else {
        render_expr(expr, style, out);
    }
}

/// Left operand of a binary operator: never needs parentheses, the band is
/// left-associative
fn render_left(expr: &RaExpression, style: &Style, out: &mut String) {
    render_expr(expr, style, out);
}

/// Right operand of a binary operator: parenthesized when itself binary
fn render_right(expr: &RaExpression, style: &Style, out: &mut String) {
    if is_binary(expr) {
        out.push('(');
        render_expr(expr, style, out);
        out.push(')');
    } else {
        render_expr(expr, style, out);
    }
}

fn render_binary(
    left: &RaExpression,
    op: &str,
    right: &RaExpression,
    style: &Style,
    out: &mut String,
) {
    render_left(left, style, out);
    out.push(' ');
    out.push_str(op);
    out.push(' ');
    render_right(right, style, out);
}

fn render_attribute_list(attrs: &[Attribute], style: &Style, out: &mut String) {
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            out.push_str(style.comma());
        }
        render_attribute(attr, out);
    }
}

fn render_attribute(attr: &Attribute, out: &mut String) {
    if let Some(rel) = &attr.relation {
        out.push_str(rel);
        out.push('.');
    }
    out.push_str(&attr.name);
}

fn bool_prec(kind: &BoolKind) -> u8 {
    match kind {
        BoolKind::Or { .. } => 1,
        BoolKind::And { .. } => 2,
        BoolKind::Not { .. } => 3,
        BoolKind::Comparison { .. } => 4,
    }
}

fn render_bool(
    expr: &BooleanExpression,
    style: &Style,
    parent_prec: u8,
    is_right: bool,
    out: &mut String,
) {
    let prec = bool_prec(&expr.kind);
    let needs_parens = prec < parent_prec || (prec == parent_prec && is_right && prec <= 2);
    if needs_parens {
        out.push('(');
    }
    match &expr.kind {
        BoolKind::Or { left, right } => {
            render_bool(left, style, 1, false, out);
            out.push_str(" \\vee ");
            render_bool(right, style, 1, true, out);
        }
        BoolKind::And { left, right } => {
            render_bool(left, style, 2, false, out);
            out.push_str(" \\wedge ");
            render_bool(right, style, 2, true, out);
        }
        BoolKind::Not { operand } => {
            out.push_str("\\neg ");
            render_bool(operand, style, 3, false, out);
        }
        BoolKind::Comparison { op, left, right } => {
            render_comparison_operand(left, out);
            let op_str = comparison_op(op);
            if style.pretty {
                out.push(' ');
                out.push_str(op_str);
                out.push(' ');
            } else {
                out.push_str(op_str);
                // a LaTeX command must not run into the next word
                if op_str.starts_with('\\') {
                    out.push(' ');
                }
            }
            render_comparison_operand(right, out);
        }
    }
    if needs_parens {
        out.push(')');
    }
}

fn comparison_op(op: &ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "=",
        ComparisonOp::NotEq => "\\neq",
        ComparisonOp::Lt => "<",
        ComparisonOp::LtEq => "\\leq",
        ComparisonOp::Gt => ">",
        ComparisonOp::GtEq => "\\geq",
    }
}

fn render_comparison_operand(operand: &Operand, out: &mut String) {
    match operand {
        Operand::Attribute(attr) => render_attribute(attr, out),
        Operand::Literal(Literal::Integer(n)) => out.push_str(&n.to_string()),
        Operand::Literal(Literal::Float(x)) => out.push_str(&format!("{x:?}")),
        Operand::Literal(Literal::String(s)) => {
            out.push('\'');
            out.push_str(s);
            out.push('\'');
        }
        Operand::Literal(Literal::Boolean(b)) => {
            out.push_str(if *b { "true" } else { "false" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AggregateFunction, Aggregation, BooleanExpression};
    use crate::parser::parse;

    fn roundtrip(expr: &RaExpression) {
        let compact = latex(expr);
        assert_eq!(
            &parse(&compact).unwrap_or_else(|e| panic!("reparse of '{compact}' failed: {e}")),
            expr,
            "compact round trip failed for '{compact}'"
        );
        let pretty = latex_pretty(expr);
        assert_eq!(
            &parse(&pretty).unwrap_or_else(|e| panic!("reparse of '{pretty}' failed: {e}")),
            expr,
            "pretty round trip failed for '{pretty}'"
        );
    }

    #[test]
    fn test_render_projection_selection() {
        let q = RaExpression::relation("Students")
            .select(BooleanExpression::compare_literal(
                Attribute::new("age"),
                ComparisonOp::Gt,
                Literal::Integer(21),
            ))
            .project(vec![Attribute::new("name"), Attribute::new("age")]);
        assert_eq!(latex(&q), "\\pi_{name,age} \\sigma_{age>21} Students");
        assert_eq!(latex_pretty(&q), "\\pi_{name, age} \\sigma_{age > 21} Students");
        roundtrip(&q);
    }

    #[test]
    fn test_render_parenthesizes_binary_operands() {
        let q = RaExpression::relation("A")
            .union(RaExpression::relation("B").intersect(RaExpression::relation("C")))
            .project(vec![Attribute::new("x")]);
        assert_eq!(latex(&q), "\\pi_{x} (A \\cup (B \\cap C))");
        roundtrip(&q);
    }

    #[test]
    fn test_render_left_associative_without_parens() {
        let q = RaExpression::relation("A")
            .union(RaExpression::relation("B"))
            .intersect(RaExpression::relation("C"));
        assert_eq!(latex(&q), "A \\cup B \\cap C");
        roundtrip(&q);
    }

    #[test]
    fn test_render_theta_join() {
        let q = RaExpression::relation("R").theta_join(
            RaExpression::relation("S"),
            BooleanExpression::compare_attributes(
                Attribute::qualified("R", "a"),
                ComparisonOp::LtEq,
                Attribute::qualified("S", "b"),
            ),
        );
        assert_eq!(latex(&q), "R \\overset{R.a\\leq S.b}{\\bowtie} S");
        roundtrip(&q);
    }

    #[test]
    fn test_render_aggregation_and_top_n() {
        let q = RaExpression::relation("Emp")
            .aggregate(
                vec![Attribute::new("dept")],
                vec![Aggregation::new(
                    Attribute::new("salary"),
                    AggregateFunction::Avg,
                    "avg_sal",
                )],
            )
            .top_n(3, Attribute::new("avg_sal"));
        assert_eq!(
            latex(&q),
            "T_{3,avg_sal} \\Gamma_{(dept),((salary,avg,avg_sal))} Emp"
        );
        roundtrip(&q);
    }

    #[test]
    fn test_render_boolean_nesting() {
        let cond = BooleanExpression::compare_literal(
            Attribute::new("a"),
            ComparisonOp::Eq,
            Literal::Integer(1),
        )
        .or(BooleanExpression::compare_literal(
            Attribute::new("b"),
            ComparisonOp::Eq,
            Literal::Integer(2),
        ))
        .and(
            BooleanExpression::compare_literal(
                Attribute::new("c"),
                ComparisonOp::Eq,
                Literal::Boolean(true),
            )
            .negate(),
        );
        let q = RaExpression::relation("R").select(cond);
        assert_eq!(latex(&q), "\\sigma_{(a=1 \\vee b=2) \\wedge \\neg c=true} R");
        roundtrip(&q);
    }

    #[test]
    fn test_round_trip_all_operators() {
        let exprs = vec![
            RaExpression::relation("R").divide(RaExpression::relation("S")),
            RaExpression::relation("R").semi_join(RaExpression::relation("S")),
            RaExpression::relation("R").anti_join(RaExpression::relation("S")),
            RaExpression::relation("R").left_join(RaExpression::relation("S")),
            RaExpression::relation("R").right_join(RaExpression::relation("S")),
            RaExpression::relation("R").outer_join(RaExpression::relation("S")),
            RaExpression::relation("R").difference(RaExpression::relation("S")),
            RaExpression::relation("R").cartesian(RaExpression::relation("S")),
            RaExpression::relation("R").rename("x"),
            RaExpression::relation("R").select(BooleanExpression::compare_literal(
                Attribute::new("s"),
                ComparisonOp::NotEq,
                Literal::String("it works".into()),
            )),
            RaExpression::relation("R").select(BooleanExpression::compare_literal(
                Attribute::new("x"),
                ComparisonOp::GtEq,
                Literal::Float(2.5),
            )),
        ];
        for e in &exprs {
            roundtrip(e);
        }
    }

    #[test]
    fn test_round_trip_negative_literal() {
        let q = RaExpression::relation("R").select(BooleanExpression::compare_literal(
            Attribute::new("delta"),
            ComparisonOp::Lt,
            Literal::Integer(-10),
        ));
        roundtrip(&q);
    }
}
