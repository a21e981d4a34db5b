//! relab CLI - validate, transpile, and visualize relational queries

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod schema;

use cli::Cli;
use commands::{render, transpile, tree, validate};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Validate(args) => validate::execute(args),
        cli::Commands::Transpile(args) => transpile::execute(args),
        cli::Commands::Render(args) => render::execute(args),
        cli::Commands::Tree(args) => tree::execute(args),
    }
}
