use super::*;

#[test]
fn test_parse_select() {
    let parser = SqlParser::new();
    assert!(parser.parse("SELECT id FROM users").is_ok());
}

#[test]
fn test_parse_query_accepts_only_select() {
    let parser = SqlParser::new();
    assert!(parser.parse_query("SELECT 1").is_ok());
    let err = parser.parse_query("DELETE FROM users").unwrap_err();
    assert_eq!(err, SqlError::UnsupportedStatement("DELETE".to_string()));
}

#[test]
fn test_empty_sql() {
    let parser = SqlParser::new();
    assert_eq!(parser.parse("   "), Err(SqlError::EmptySql));
}

#[test]
fn test_parse_error_carries_location() {
    let parser = SqlParser::new();
    match parser.parse("SELECT FROM FROM") {
        Err(SqlError::ParseError { line, .. }) => assert_eq!(line, 1),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_multiple_statements() {
    let parser = SqlParser::new();
    let stmts = parser.parse("SELECT 1; SELECT 2").unwrap();
    assert_eq!(stmts.len(), 2);
}
