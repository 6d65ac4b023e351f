//! # Image uploads
//!
//! An upload is split in three so the editor is never held across an
//! await:
//!
//! ```text
//! begin_image_upload ──▶ UploadTicket ──▶ upload_with_policy ──▶ complete_image_upload
//!   (validate, record       (plain data)     (async, no editor)     (insert or report)
//!    caret + generation)
//! ```
//!
//! The editor keeps the recorded caret of every pending upload and moves it
//! along with each edit, so the image lands where the upload began even
//! when the document changed meanwhile.

use futures::future::BoxFuture;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::{EditorError, Position};

/// An image chosen, pasted or dropped by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if !self.is_image() {
            return Err(EditorError::UnsupportedMediaType(self.mime_type.clone()));
        }
        if self.bytes.is_empty() {
            return Err(EditorError::EmptyUpload);
        }
        Ok(())
    }

    /// Alt text for the inserted image: the file name without extension.
    pub fn alt_text(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("{0}")]
    Failed(String),

    #[error("Upload timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Stores image bytes somewhere and returns a URL for them.
pub trait ImageUploader {
    fn upload(&self, file: ImageFile) -> BoxFuture<'static, Result<String, UploadError>>;
}

impl<F> ImageUploader for F
where
    F: Fn(ImageFile) -> BoxFuture<'static, Result<String, UploadError>>,
{
    fn upload(&self, file: ImageFile) -> BoxFuture<'static, Result<String, UploadError>> {
        self(file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Bound on each attempt
    pub timeout: Duration,

    /// Attempts after the first
    pub retries: u32,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 1,
        }
    }
}

/// Run `uploader` under `policy`. A rejection is final; failures and
/// timeouts are retried until attempts run out, and the last error wins.
pub async fn upload_with_policy(
    uploader: &dyn ImageUploader,
    file: ImageFile,
    policy: UploadPolicy,
) -> Result<String, UploadError> {
    let attempts = policy.retries.saturating_add(1);
    let mut last_error = UploadError::Failed("no upload attempted".to_string());

    for attempt in 1..=attempts {
        let result = match tokio::time::timeout(policy.timeout, uploader.upload(file.clone())).await {
            Ok(result) => result,
            Err(_) => Err(UploadError::TimedOut(policy.timeout)),
        };

        match result {
            Ok(url) => return Ok(url),
            Err(error @ UploadError::Rejected { .. }) => {
                warn!(file = %file.name, attempt, %error, "Upload rejected");
                return Err(error);
            }
            Err(error) => {
                warn!(file = %file.name, attempt, attempts, %error, "Upload attempt failed");
                last_error = error;
            }
        }
    }

    Err(last_error)
}

/// Claim on one pending upload, for the document generation it started in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub(crate) generation: u64,
    pub(crate) id: u64,
    pub(crate) alt: String,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }
}

/// An upload the editor is waiting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingUpload {
    pub id: u64,
    pub position: Position,
    pub alt: String,

    /// Set when the upload finished while the raw-HTML buffer had edits
    pub src: Option<String>,
}

/// One item of a paste or drop payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferItem {
    File(ImageFile),
    Text(String),
    Html(String),
}

impl TransferItem {
    /// The item as image data, if it is any.
    pub fn image(&self) -> Option<&ImageFile> {
        match self {
            TransferItem::File(file) if file.is_image() => Some(file),
            _ => None,
        }
    }
}
