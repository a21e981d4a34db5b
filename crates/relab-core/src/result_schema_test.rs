use super::*;
use crate::schema::TableSchema;

fn table_r() -> TableSchema {
    TableSchema::new([("a", DataType::Integer), ("b", DataType::Varchar)])
}

fn table_s() -> TableSchema {
    TableSchema::new([("b", DataType::Char), ("c", DataType::Date)])
}

#[test]
fn test_from_table() {
    let rs = ResultSchema::from_table("R", &table_r());
    assert_eq!(rs.len(), 2);
    assert_eq!(rs.attributes()[0].name, "a");
    assert_eq!(rs.groups().len(), 1);
    assert_eq!(rs.groups()[0].0.as_deref(), Some("R"));
}

#[test]
fn test_resolve_unqualified_unique() {
    let rs = ResultSchema::from_table("R", &table_r());
    match rs.resolve(&Attribute::new("a")) {
        Resolution::Unique(r) => {
            assert_eq!(r.relation, Some("R"));
            assert_eq!(r.attribute.data_type, DataType::Integer);
        }
        other => panic!("expected unique resolution, got {other:?}"),
    }
}

#[test]
fn test_resolve_qualified() {
    let rs = ResultSchema::merge_cartesian(
        &ResultSchema::from_table("R", &table_r()),
        &ResultSchema::from_table("S", &table_s()),
    );
    let r = rs.resolve(&Attribute::qualified("S", "b")).unique().unwrap();
    assert_eq!(r.attribute.data_type, DataType::Char);
    assert!(matches!(
        rs.resolve(&Attribute::qualified("T", "b")),
        Resolution::NotFound
    ));
}

#[test]
fn test_resolve_ambiguous_lists_contributors() {
    let rs = ResultSchema::merge_cartesian(
        &ResultSchema::from_table("R", &table_r()),
        &ResultSchema::from_table("S", &table_s()),
    );
    match rs.resolve(&Attribute::new("b")) {
        Resolution::Ambiguous(rels) => assert_eq!(rels, ["R", "S"]),
        other => panic!("expected ambiguous resolution, got {other:?}"),
    }
}

#[test]
fn test_resolve_not_found() {
    let rs = ResultSchema::from_table("R", &table_r());
    assert!(matches!(
        rs.resolve(&Attribute::new("zzz")),
        Resolution::NotFound
    ));
}

#[test]
fn test_cartesian_same_relation_overwrites() {
    let left = ResultSchema::from_table("R", &table_r());
    let mut changed = table_r();
    changed.columns[0].data_type = DataType::Real;
    let right = ResultSchema::from_table("R", &changed);
    let merged = ResultSchema::merge_cartesian(&left, &right);
    // one group, right side wins on the duplicate name
    assert_eq!(merged.groups().len(), 1);
    let r = merged.resolve(&Attribute::qualified("R", "a")).unique().unwrap();
    assert_eq!(r.attribute.data_type, DataType::Real);
}

#[test]
fn test_natural_merge_folds_shared_under_none() {
    let left = ResultSchema::from_table("R", &table_r());
    let right = ResultSchema::from_table("S", &table_s());
    let merged = ResultSchema::merge_natural(&left, &right);

    // unqualified "b" resolves uniquely to the shared entry, dominant type
    let r = merged.resolve(&Attribute::new("b")).unique().unwrap();
    assert_eq!(r.relation, None);
    assert_eq!(r.attribute.data_type, DataType::Varchar);

    // the per-side qualified names remain resolvable with their own types
    let rb = merged.resolve(&Attribute::qualified("R", "b")).unique().unwrap();
    assert_eq!(rb.attribute.data_type, DataType::Varchar);
    let sb = merged.resolve(&Attribute::qualified("S", "b")).unique().unwrap();
    assert_eq!(sb.attribute.data_type, DataType::Char);

    // positional list: shared first, then left rest, then right rest
    let names: Vec<&str> = merged.attributes().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["b", "a", "c"]);
}

#[test]
fn test_re_keyed() {
    let rs = ResultSchema::merge_natural(
        &ResultSchema::from_table("R", &table_r()),
        &ResultSchema::from_table("S", &table_s()),
    );
    let renamed = rs.re_keyed("X");
    assert_eq!(renamed.groups().len(), 1);
    assert!(renamed.resolve(&Attribute::qualified("X", "c")).unique().is_some());
    assert!(matches!(
        renamed.resolve(&Attribute::qualified("R", "b")),
        Resolution::NotFound
    ));
}

#[test]
fn test_shared_names_order_and_dedup() {
    let left = ResultSchema::from_table("R", &table_r());
    let right = ResultSchema::from_table("S", &table_s());
    assert_eq!(ResultSchema::shared_names(&left, &right), ["b"]);
    assert!(ResultSchema::shared_names(&left, &left).contains(&"a".to_string()));
}
