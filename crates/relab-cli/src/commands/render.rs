//! `relab render` - normalize the LaTeX form of an RA query

use crate::cli::RenderArgs;
use anyhow::Result;

pub fn execute(args: &RenderArgs) -> Result<()> {
    let expr = relab_ra::parse(&args.query)?;
    if args.pretty {
        println!("{}", relab_ra::latex_pretty(&expr));
    } else {
        println!("{}", relab_ra::latex(&expr));
    }
    Ok(())
}
