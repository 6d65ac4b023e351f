use anyhow::Result;
use clap::Args;
use colored::Colorize;
use richdoc_editor::VideoProviderRegistry;

#[derive(Debug, Args)]
pub struct VideoArgs {
    /// Video page URL, as a user would paste it
    pub url: String,
}

pub fn video(args: VideoArgs) -> Result<()> {
    let registry = VideoProviderRegistry::with_defaults();
    let embed = registry.resolve(&args.url)?;

    eprintln!("{} {}", "✓".green(), embed.provider.bold());
    println!("id:    {}", embed.video_id);
    println!("embed: {}", embed.src);
    Ok(())
}
