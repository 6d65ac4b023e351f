//! # Video embeds
//!
//! Providers turn a pasted URL into an [`VideoEmbed`]. The default registry
//! knows YouTube; hosts can register more.

use regex::Regex;
use richdoc_model::VideoEmbed;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::EditorError;

/// Recognizes video URLs of one service.
pub trait VideoProvider {
    fn name(&self) -> &str;

    /// The embed for `url`, or `None` if it is not one of ours.
    fn resolve(&self, url: &Url) -> Option<VideoEmbed>;
}

static YOUTUBE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id pattern"));

/// `youtu.be/ID`, `youtube.com/watch?v=ID`, `/embed/ID` and `/shorts/ID`,
/// also on `youtube-nocookie.com` and the `www.`/`m.` hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct YouTube;

impl YouTube {
    fn video_id(url: &Url) -> Option<String> {
        let host = url.host_str()?.to_ascii_lowercase();
        let host = host
            .strip_prefix("www.")
            .or_else(|| host.strip_prefix("m."))
            .unwrap_or(&host);

        let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
        let id = match host {
            "youtu.be" => segments.next().map(str::to_string),
            "youtube.com" | "youtube-nocookie.com" => match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("embed" | "shorts") => segments.next().map(str::to_string),
                _ => None,
            },
            _ => None,
        }?;

        YOUTUBE_ID.is_match(&id).then_some(id)
    }
}

impl VideoProvider for YouTube {
    fn name(&self) -> &str {
        "youtube"
    }

    fn resolve(&self, url: &Url) -> Option<VideoEmbed> {
        let id = Self::video_id(url)?;
        Some(VideoEmbed {
            provider: self.name().to_string(),
            src: format!("https://www.youtube-nocookie.com/embed/{}", id),
            video_id: id,
        })
    }
}

/// Ordered set of providers; the first to recognize a URL wins.
pub struct VideoProviderRegistry {
    providers: Vec<Box<dyn VideoProvider>>,
}

impl VideoProviderRegistry {
    /// A registry with no providers.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(YouTube);
        registry
    }

    pub fn register(&mut self, provider: impl VideoProvider + 'static) {
        self.providers.push(Box::new(provider));
    }

    pub fn resolve(&self, input: &str) -> Result<VideoEmbed, EditorError> {
        let invalid = || EditorError::InvalidVideoUrl(input.to_string());
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let url = Url::parse(trimmed)
            .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
            .map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid());
        }

        self.providers
            .iter()
            .find_map(|provider| provider.resolve(&url))
            .ok_or_else(invalid)
    }
}

impl Default for VideoProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for VideoProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|provider| provider.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_shapes_resolve_to_same_id() {
        let registry = VideoProviderRegistry::default();
        let urls = [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
        ];
        for url in urls {
            let embed = registry.resolve(url).unwrap();
            assert_eq!(embed.video_id, "dQw4w9WgXcQ", "{}", url);
            assert_eq!(embed.src, "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ");
            assert_eq!(embed.provider, "youtube");
        }
    }

    #[test]
    fn test_rejects_foreign_and_malformed_urls() {
        let registry = VideoProviderRegistry::default();
        for url in [
            "https://vimeo.com/123456",
            "https://youtube.com/watch?v=short",
            "https://youtube.com.evil.example/watch?v=dQw4w9WgXcQ",
            "ftp://youtu.be/dQw4w9WgXcQ",
            "   ",
        ] {
            assert!(
                matches!(registry.resolve(url), Err(EditorError::InvalidVideoUrl(_))),
                "{}",
                url
            );
        }
    }

    #[test]
    fn test_empty_registry_recognizes_nothing() {
        let registry = VideoProviderRegistry::new();
        assert!(registry.resolve("https://youtu.be/dQw4w9WgXcQ").is_err());
    }
}
