use anyhow::Context;
use richdoc_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "richdoc.config.json";

/// Richdoc configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Editor tunables, including the default link target
    #[serde(default)]
    pub editor: EditorConfig,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = Self::path_in(cwd);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Cannot read {}", config_path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid config in {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn path_in(cwd: &Path) -> PathBuf {
        cwd.join(DEFAULT_CONFIG_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "editor": { "linkTarget": "_self", "historyLimit": 20 }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.editor.link_target, "_self");
        assert_eq!(config.editor.history_limit, 20);
        assert_eq!(config.editor.upload_retries, 1);
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = std::env::temp_dir().join("richdoc-cli-no-config");
        let config = Config::load(&dir).unwrap();
        assert_eq!(config.editor.link_target, "_blank");
    }
}
