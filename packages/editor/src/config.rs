//! Editor configuration

use crate::upload::UploadPolicy;
use richdoc_compiler_html::SerializeOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for an editing session. Every field has a default, so a partial
/// JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Maximum undo levels (0 = unlimited)
    pub history_limit: usize,

    /// Per-attempt upload timeout
    pub upload_timeout_ms: u64,

    /// Extra attempts after a failed or timed-out upload
    pub upload_retries: u32,

    pub default_table_rows: usize,
    pub default_table_columns: usize,

    /// `target` for links that do not carry their own
    pub link_target: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            upload_timeout_ms: 30_000,
            upload_retries: 1,
            default_table_rows: 3,
            default_table_columns: 3,
            link_target: "_blank".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            timeout: self.upload_timeout(),
            retries: self.upload_retries,
        }
    }

    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            link_target: self.link_target.clone(),
        }
    }
}
