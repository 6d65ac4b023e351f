mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{parse, render, video, ParseArgs, RenderArgs, VideoArgs};
use tracing_subscriber::EnvFilter;

/// Richdoc CLI - render and inspect rich-text documents
#[derive(Parser, Debug)]
#[command(name = "richdoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a stored document to HTML
    Render(RenderArgs),

    /// Read HTML into a document tree (JSON)
    Parse(ParseArgs),

    /// Resolve a video URL to its embed
    Video(VideoArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("RICHDOC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Render(args) => render(args, &cwd),
            Command::Parse(args) => parse(args),
            Command::Video(args) => video(args),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
