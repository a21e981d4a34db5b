use super::*;
use clap::Parser;

#[test]
fn test_validate_defaults_to_ra() {
    let cli = Cli::try_parse_from([
        "relab",
        "validate",
        "--schema",
        "schema.yaml",
        "\\pi_{a} R",
    ])
    .unwrap();
    match cli.command {
        Commands::Validate(args) => {
            assert_eq!(args.lang, Lang::Ra);
            assert!(!args.json);
            assert_eq!(args.query, "\\pi_{a} R");
        }
        _ => panic!("expected validate"),
    }
}

#[test]
fn test_transpile_from_sql() {
    let cli = Cli::try_parse_from([
        "relab",
        "transpile",
        "--schema",
        "db.yaml",
        "--from",
        "sql",
        "--pretty",
        "SELECT 1",
    ])
    .unwrap();
    match cli.command {
        Commands::Transpile(args) => {
            assert_eq!(args.from, Lang::Sql);
            assert!(args.pretty);
        }
        _ => panic!("expected transpile"),
    }
}

#[test]
fn test_schema_is_required_for_tree() {
    assert!(Cli::try_parse_from(["relab", "tree", "R"]).is_err());
}

#[test]
fn test_render_needs_no_schema() {
    assert!(Cli::try_parse_from(["relab", "render", "R \\cup S"]).is_ok());
}
