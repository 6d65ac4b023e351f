//! # Editor Commands
//!
//! Everything a toolbar, shortcut or host can ask the editor to do, as one
//! serializable enum. [`Editor::execute`](crate::Editor::execute) dispatches
//! a command to the structured surface.
//!
//! ## Outcomes
//!
//! A command that cannot apply (raw-HTML mode, a table command outside a
//! table, undo with empty history) is not an error: it reports
//! [`Outcome::Ignored`]. Errors are kept for input the user must fix, such
//! as a video URL no provider recognizes.

use richdoc_model::{Align, FormatFlags, HeadingLevel, ListKind, Node};
use serde::{Deserialize, Serialize};

use crate::Selection;

/// Editor commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Command {
    ToggleMark {
        mark: Mark,
    },

    SetBlockType {
        block: BlockType,
    },

    SetAlignment {
        align: Align,
    },

    /// `None` when the link prompt was cancelled; a blank URL removes the link
    SetLink {
        url: Option<String>,
    },

    RemoveLink,

    InsertText {
        text: String,
    },

    /// Soft break inside the current block (Shift+Enter)
    InsertLineBreak,

    /// Enter
    SplitBlock,

    /// Backspace
    DeleteBackward,

    DeleteSelection,

    /// Insert an image whose URL is already known
    InsertImage {
        src: String,
        alt: String,
    },

    /// Missing dimensions fall back to the configured defaults
    InsertTable {
        rows: Option<usize>,
        columns: Option<usize>,
    },

    InsertRow {
        side: Side,
    },

    InsertColumn {
        side: Side,
    },

    DeleteRow,

    DeleteColumn,

    InsertVideo {
        url: String,
    },

    Undo,

    Redo,

    ClearFormatting,

    SetSelection {
        selection: Selection,
    },

    SelectAll,
}

impl Command {
    /// Label recorded in the undo history
    pub fn description(&self) -> &'static str {
        match self {
            Command::ToggleMark { .. } => "Format",
            Command::SetBlockType { .. } => "Block type",
            Command::SetAlignment { .. } => "Align",
            Command::SetLink { .. } => "Link",
            Command::RemoveLink => "Remove link",
            Command::InsertText { .. } => "Typing",
            Command::InsertLineBreak => "Line break",
            Command::SplitBlock => "Split block",
            Command::DeleteBackward => "Delete",
            Command::DeleteSelection => "Delete selection",
            Command::InsertImage { .. } => "Insert image",
            Command::InsertTable { .. } => "Insert table",
            Command::InsertRow { .. } => "Insert row",
            Command::InsertColumn { .. } => "Insert column",
            Command::DeleteRow => "Delete row",
            Command::DeleteColumn => "Delete column",
            Command::InsertVideo { .. } => "Insert video",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::ClearFormatting => "Clear formatting",
            Command::SetSelection { .. } => "Select",
            Command::SelectAll => "Select all",
        }
    }
}

/// Inline marks offered by the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl Mark {
    pub const ALL: [Mark; 5] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Underline,
        Mark::Strikethrough,
        Mark::Code,
    ];

    pub fn flag(self) -> FormatFlags {
        match self {
            Mark::Bold => FormatFlags::BOLD,
            Mark::Italic => FormatFlags::ITALIC,
            Mark::Underline => FormatFlags::UNDERLINE,
            Mark::Strikethrough => FormatFlags::STRIKETHROUGH,
            Mark::Code => FormatFlags::CODE,
        }
    }
}

/// Block types a text block can be switched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    Paragraph,
    Heading { level: HeadingLevel },
    Quote,
    BulletList,
    NumberedList,
    TaskList,
}

impl BlockType {
    /// Choices shown in the block-type menu
    pub const TOOLBAR: [BlockType; 7] = [
        BlockType::Paragraph,
        BlockType::Heading {
            level: HeadingLevel::H1,
        },
        BlockType::Heading {
            level: HeadingLevel::H2,
        },
        BlockType::Heading {
            level: HeadingLevel::H3,
        },
        BlockType::Quote,
        BlockType::BulletList,
        BlockType::NumberedList,
    ];

    pub fn list_kind(self) -> Option<ListKind> {
        match self {
            BlockType::BulletList => Some(ListKind::Bullet),
            BlockType::NumberedList => Some(ListKind::Ordered),
            BlockType::TaskList => Some(ListKind::Task),
            BlockType::Paragraph | BlockType::Heading { .. } | BlockType::Quote => None,
        }
    }

    /// A text block of this type holding `children`. List types produce a
    /// list item, to be placed in a list of that kind.
    pub(crate) fn build(self, align: Option<Align>, children: Vec<Node>) -> Node {
        match self {
            BlockType::Paragraph => Node::Paragraph { align, children },
            BlockType::Heading { level } => Node::Heading {
                level,
                align,
                children,
            },
            BlockType::Quote => Node::Quote { align, children },
            BlockType::BulletList | BlockType::NumberedList | BlockType::TaskList => Node::ListItem {
                checked: (self == BlockType::TaskList).then_some(false),
                align,
                children,
            },
        }
    }
}

/// Which side of the caret's row or column a new one goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Before,
    After,
}

/// What a command did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The document or selection changed
    Applied,

    /// Nothing to do in the current state
    Ignored,

    /// A completed upload arrived for a document that has since moved on
    Discarded,

    /// An upload failed; an error event was emitted
    Failed,

    /// An upload finished while the raw-HTML buffer had edits; its image
    /// goes in when structured editing resumes
    Queued,
}

/// Which surface the editor shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Structured,
    RawHtml,
}

/// Notifications for the host, drained with
/// [`Editor::take_events`](crate::Editor::take_events)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// The document changed; `html` is its serialized form
    Changed { html: String },

    /// Something the user should be told about
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let command = Command::SetBlockType {
            block: BlockType::Heading {
                level: HeadingLevel::H3,
            },
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "SetBlockType": { "block": { "Heading": { "level": 3 } } } })
        );
        let parsed: Command = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn test_unit_command_from_string() {
        let parsed: Command = serde_json::from_str("\"Undo\"").unwrap();
        assert_eq!(parsed, Command::Undo);
    }

    #[test]
    fn test_toolbar_heading_levels() {
        let levels: Vec<u8> = BlockType::TOOLBAR
            .iter()
            .filter_map(|block| match block {
                BlockType::Heading { level } => Some(level.number()),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_event_is_tagged() {
        let event = EditorEvent::Error {
            message: "nope".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "type": "error", "message": "nope" })
        );
    }
}
