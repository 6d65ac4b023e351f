//! # Undo/Redo Stack
//!
//! Tracks edit history as document snapshots.
//!
//! ## Design
//!
//! - Each committed edit records the state from before it
//! - Undo swaps the current state for the recorded one and keeps the
//!   current state for redo
//! - New edits clear the redo stack
//! - Consecutive edits of the same kind (typing, deleting) can coalesce
//!   into one step until the stack is sealed by a caret move

use crate::Selection;
use richdoc_model::Root;

/// Document and selection at one point in history
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub root: Root,
    pub selection: Selection,
}

/// One undo step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// State to return to
    pub snapshot: Snapshot,

    /// Optional description of this step
    pub description: Option<String>,
}

/// Undo/redo stack for structured editing
#[derive(Debug)]
pub struct UndoStack {
    /// Recorded steps (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone steps (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Whether the next coalescing edit may extend the last entry
    open_run: bool,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            open_run: false,
        }
    }

    /// Record the state from before an edit.
    ///
    /// With `coalesce`, an edit with the same description as the previous
    /// one extends that step instead of adding a new one.
    pub fn record(&mut self, before: Snapshot, description: &str, coalesce: bool) {
        let extends_last = coalesce
            && self.open_run
            && self.redo_stack.is_empty()
            && self.undo_description() == Some(description);

        self.open_run = coalesce;
        if extends_last {
            return;
        }

        self.undo_stack.push(HistoryEntry {
            snapshot: before,
            description: Some(description.to_string()),
        });

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // Clear redo stack (new action invalidates future)
        self.redo_stack.clear();
    }

    /// Stop the current coalescing run.
    pub fn seal(&mut self) {
        self.open_run = false;
    }

    /// Undo the most recent step, returning the state to restore.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let entry = self.undo_stack.pop()?;
        self.open_run = false;
        self.redo_stack.push(HistoryEntry {
            snapshot: current,
            description: entry.description.clone(),
        });
        Some(entry.snapshot)
    }

    /// Redo the most recently undone step, returning the state to restore.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let entry = self.redo_stack.pop()?;
        self.open_run = false;
        self.undo_stack.push(HistoryEntry {
            snapshot: current,
            description: entry.description.clone(),
        });
        Some(entry.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_run = false;
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richdoc_model::Node;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot {
            root: Root::new(vec![Node::paragraph(vec![Node::text(text)])]),
            selection: Selection::default(),
        }
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_record_undo_and_redo() {
        let mut stack = UndoStack::new();
        stack.record(snapshot("before"), "Edit", false);

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo_description(), Some("Edit"));

        let restored = stack.undo(snapshot("after")).unwrap();
        assert_eq!(restored, snapshot("before"));
        assert_eq!(stack.redo_levels(), 1);
        assert_eq!(stack.redo_description(), Some("Edit"));

        let redone = stack.redo(snapshot("before")).unwrap();
        assert_eq!(redone, snapshot("after"));
        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_empty_stack_is_noop() {
        let mut stack = UndoStack::new();
        assert!(stack.undo(snapshot("x")).is_none());
        assert!(stack.redo(snapshot("x")).is_none());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut stack = UndoStack::new();
        stack.record(snapshot("a"), "Edit", false);
        stack.undo(snapshot("b"));
        assert_eq!(stack.redo_levels(), 1);

        stack.record(snapshot("a"), "Edit", false);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_typing_coalesces_until_sealed() {
        let mut stack = UndoStack::new();
        stack.record(snapshot(""), "Typing", true);
        stack.record(snapshot("a"), "Typing", true);
        stack.record(snapshot("ab"), "Typing", true);
        assert_eq!(stack.undo_levels(), 1);

        stack.seal();
        stack.record(snapshot("abc"), "Typing", true);
        assert_eq!(stack.undo_levels(), 2);

        stack.record(snapshot("abcd"), "Bold", false);
        stack.record(snapshot("abcd"), "Typing", true);
        assert_eq!(stack.undo_levels(), 4);

        // The first run restores to the state before it started.
        stack.undo(snapshot("now"));
        stack.undo(snapshot("now"));
        stack.undo(snapshot("now"));
        assert_eq!(stack.undo(snapshot("now")), Some(snapshot("")));
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut stack = UndoStack::with_max_levels(2);
        for i in 0..3 {
            stack.record(snapshot(&format!("Text {}", i)), "Edit", false);
        }
        assert_eq!(stack.undo_levels(), 2);
    }
}
