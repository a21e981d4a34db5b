//! `relab validate` - check a query against a schema

use crate::cli::{Lang, ValidateArgs};
use crate::commands::report;
use crate::schema;
use anyhow::Result;
use relab_core::QueryError;
use relab_sql::SqlParser;

pub fn execute(args: &ValidateArgs) -> Result<()> {
    let schema = schema::load(&args.schema)?;

    let errors: Vec<QueryError> = match args.lang {
        Lang::Ra => match relab_ra::parse(&args.query) {
            Err(syntax) => vec![syntax.into()],
            Ok(expr) => match relab_analysis::validate(&expr, &schema) {
                Err(semantic) => vec![semantic.into()],
                Ok(()) => Vec::new(),
            },
        },
        Lang::Sql => match SqlParser::new().parse_query(&args.query) {
            Err(parse) => vec![QueryError {
                title: "SQL parse error".to_string(),
                description: Some(parse.to_string()),
                hint: None,
                position: None,
            }],
            Ok(query) => match relab_sql::validate_query(&query, &schema) {
                Err(semantic) => vec![semantic.into()],
                Ok(()) => Vec::new(),
            },
        },
    };

    if errors.is_empty() {
        if args.json {
            println!("[]");
        } else {
            println!("OK");
        }
        return Ok(());
    }
    report(errors, args.json)
}
