use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use richdoc_model::parse_html;
use std::path::PathBuf;

use super::read_input;

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// HTML file to read, or `-` for stdin
    pub input: PathBuf,

    /// Print the tree on a single line
    #[arg(long)]
    pub compact: bool,
}

pub fn parse(args: ParseArgs) -> Result<()> {
    let source = read_input(&args.input)?;
    let root = parse_html(&source);

    let json = if args.compact {
        serde_json::to_string(&root)
    } else {
        serde_json::to_string_pretty(&root)
    }
    .context("Cannot encode document tree")?;

    eprintln!(
        "{} {} blocks from {}",
        "✓".green(),
        root.children.len(),
        args.input.display()
    );
    println!("{}", json);
    Ok(())
}
