use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use richdoc_compiler_html::serialize_with;
use richdoc_model::Document;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::read_input;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Stored document (JSON), an `.html` file, or `-` for stdin
    pub input: PathBuf,

    /// Link target (overrides config)
    #[arg(long)]
    pub link_target: Option<String>,
}

pub fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut options = config.editor.serialize_options();
    if let Some(target) = args.link_target {
        options.link_target = target;
    }

    let source = read_input(&args.input)?;
    let document = load_document(&args.input, &source);
    debug!(input = %args.input.display(), html = matches!(document, Some(Document::Html(_))), "Rendering document");

    if document.is_none() {
        eprintln!("{}", "⚠️  Input holds no document".yellow());
    }
    println!("{}", serialize_with(document.as_ref(), &options));
    Ok(())
}

/// `.html` files are legacy HTML content; anything else is a stored value.
pub(crate) fn load_document(path: &Path, source: &str) -> Option<Document> {
    let is_html = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

    if is_html {
        (!source.trim().is_empty()).then(|| Document::from(source))
    } else {
        Document::from_json_str(source)
    }
}
