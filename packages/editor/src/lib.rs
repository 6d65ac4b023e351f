//! # Richdoc Editor
//!
//! Interactive editing of rich-text documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: toolbar, keyboard, paste/drop, value  │
//! └─────────────────────────────────────────────┘
//!            ↓ Command            ↑ EditorEvent
//! ┌─────────────────────────────────────────────┐
//! │ editor: Editor / EditorHandle               │
//! │  - Structured surface (tree + selection)    │
//! │  - Raw HTML surface (text buffer)           │
//! │  - Undo history, uploads, video embeds      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ compiler-html: Root → HTML                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: HTML is always derived from it
//! 2. **Commands never fail on state**: inapplicable commands are ignored
//! 3. **Uploads never hold the editor**: begin, upload, then complete
//!
//! ## Usage
//!
//! ```rust,ignore
//! use richdoc_editor::{Command, Editor, Mark};
//! use richdoc_model::Document;
//!
//! let mut editor = Editor::new(Some(&Document::from("<p>Hello</p>")));
//! editor.execute(Command::SelectAll)?;
//! editor.execute(Command::ToggleMark { mark: Mark::Bold })?;
//! assert_eq!(editor.html(), "<p><strong>Hello</strong></p>");
//! ```

mod blocks;
pub mod commands;
pub mod config;
pub mod document;
pub mod editor;
pub mod errors;
mod inline;
mod mapping;
mod normalize;
pub mod selection;
pub mod session;
pub mod structured;
pub mod undo_stack;
pub mod upload;
pub mod video;

pub use commands::{BlockType, Command, EditorEvent, Mark, Mode, Outcome, Side};
pub use config::EditorConfig;
pub use document::StructuredState;
pub use editor::{Editor, RawHtmlState, Surface};
pub use errors::EditorError;
pub use selection::{Position, Selection};
pub use session::{EditorHandle, UploadBatch};
pub use structured::Structured;
pub use undo_stack::{HistoryEntry, Snapshot, UndoStack};
pub use upload::{
    upload_with_policy, ImageFile, ImageUploader, TransferItem, UploadError, UploadPolicy,
    UploadTicket,
};
pub use video::{VideoProvider, VideoProviderRegistry, YouTube};
