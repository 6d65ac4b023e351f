//! Error types for the editor

use crate::upload::UploadError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Not a recognized video URL: {0}")]
    InvalidVideoUrl(String),

    #[error("Image file is empty")]
    EmptyUpload,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Editor has been torn down")]
    TornDown,
}
