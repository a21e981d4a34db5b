//! `relab tree` - print the annotated operator tree

use crate::cli::TreeArgs;
use crate::schema;
use anyhow::Result;
use relab_analysis::{build_tree, TreeNode};

pub fn execute(args: &TreeArgs) -> Result<()> {
    let schema = schema::load(&args.schema)?;
    let expr = relab_ra::parse(&args.query)?;
    let tree = build_tree(&expr, &schema);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print_node(&tree.root, 0);
    }
    Ok(())
}

fn print_node(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = node_label(node);
    if node.errors.is_empty() {
        println!("{indent}#{} {label}", node.id);
    } else {
        let titles: Vec<&str> = node.errors.iter().map(|e| e.title.as_str()).collect();
        println!("{indent}#{} {label}  !! {}", node.id, titles.join(", "));
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn node_label(node: &TreeNode) -> String {
    use relab_analysis::TreeNodeKind as K;
    match &node.kind {
        K::Relation { name } => name.clone(),
        K::Projection { attributes } => format!("π {}", attributes.join(", ")),
        K::Selection { condition } => format!("σ {condition}"),
        K::Rename { alias } => format!("ρ {alias}"),
        K::SetOperation { kind } => kind.clone(),
        K::Join { kind } => kind.clone(),
        K::ThetaJoin { condition } => format!("theta join {condition}"),
        K::Division => "division".to_string(),
        K::GroupedAggregation {
            group_by,
            aggregations,
        } => format!("Γ ({}) {}", group_by.join(", "), aggregations.join(", ")),
        K::TopN { limit, attribute } => format!("top {limit} by {attribute}"),
    }
}
