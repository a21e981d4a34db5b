//! CLI command implementations

pub mod render;
pub mod transpile;
pub mod tree;
pub mod validate;

use relab_core::QueryError;

/// Print one error report the way a student reads it
pub(crate) fn print_error(error: &QueryError) {
    match &error.position {
        Some(pos) => eprintln!("error: {} ({})", error.title, pos),
        None => eprintln!("error: {}", error.title),
    }
    if let Some(description) = &error.description {
        eprintln!("  {description}");
    }
    if let Some(hint) = &error.hint {
        eprintln!("  hint: {hint}");
    }
}

/// Report a list of errors, as text or JSON, and fail the command
pub(crate) fn report(errors: Vec<QueryError>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&errors)?);
    } else {
        for error in &errors {
            print_error(error);
        }
    }
    anyhow::bail!("query is invalid")
}
