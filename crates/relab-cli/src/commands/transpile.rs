//! `relab transpile` - translate a query into the other language

use crate::cli::{Lang, TranspileArgs};
use crate::schema;
use anyhow::{Context, Result};
use relab_sql::SqlParser;
use relab_transpile::{ra_to_sql, sql_to_ra};

pub fn execute(args: &TranspileArgs) -> Result<()> {
    let schema = schema::load(&args.schema)?;

    match args.from {
        Lang::Ra => {
            let expr = relab_ra::parse(&args.query)
                .context("cannot parse the relational algebra query")?;
            let sql = ra_to_sql(&expr, &schema)?;
            if args.pretty {
                println!("{}", sql.to_sql_pretty());
            } else {
                println!("{sql}");
            }
        }
        Lang::Sql => {
            let query = SqlParser::new()
                .parse_query(&args.query)
                .context("cannot parse the SQL query")?;
            let expr = sql_to_ra(&query, &schema)?;
            if args.pretty {
                println!("{}", relab_ra::latex_pretty(&expr));
            } else {
                println!("{}", relab_ra::latex(&expr));
            }
        }
    }
    Ok(())
}
