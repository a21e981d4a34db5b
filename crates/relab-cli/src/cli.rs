//! Command-line interface definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// relab - a teaching compiler for relational query languages
#[derive(Parser)]
#[command(name = "relab", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a query against a schema and explain every violation
    Validate(ValidateArgs),
    /// Translate a query into the other language
    Transpile(TranspileArgs),
    /// Re-render a relational algebra query as LaTeX
    Render(RenderArgs),
    /// Print the annotated operator tree of a relational algebra query
    Tree(TreeArgs),
}

/// Source language of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Lang {
    /// LaTeX-notation relational algebra
    Ra,
    /// SQL
    Sql,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Query text
    pub query: String,

    /// Query language
    #[arg(long, value_enum, default_value_t = Lang::Ra)]
    pub lang: Lang,

    /// Schema file (YAML or JSON): table -> column -> type
    #[arg(long)]
    pub schema: PathBuf,

    /// Emit the error list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TranspileArgs {
    /// Query text
    pub query: String,

    /// Language the query is written in; output is the other one
    #[arg(long, value_enum, default_value_t = Lang::Ra)]
    pub from: Lang,

    /// Schema file (YAML or JSON): table -> column -> type
    #[arg(long)]
    pub schema: PathBuf,

    /// Multi-line output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Relational algebra query text
    pub query: String,

    /// Spaced output instead of compact
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Relational algebra query text
    pub query: String,

    /// Schema file (YAML or JSON): table -> column -> type
    #[arg(long)]
    pub schema: PathBuf,

    /// Emit the tree as JSON instead of indented text
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
