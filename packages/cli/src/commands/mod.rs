pub mod parse;
pub mod render;
pub mod video;

pub use parse::{parse, ParseArgs};
pub use render::{render, RenderArgs};
pub use video::{video, VideoArgs};

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read a file, or stdin when the path is `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Cannot read stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}
