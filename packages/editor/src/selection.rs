use serde::{Deserialize, Serialize};

/// A caret location: the index of a text block in document order and a
/// character offset into its inline content. Line breaks and images count
/// as one character.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// The user's selection. `anchor` is where it started, `focus` where the
/// caret is now; either may come first in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
        }
    }

    pub fn range(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn start(&self) -> Position {
        self.anchor.min(self.focus)
    }

    pub fn end(&self) -> Position {
        self.anchor.max(self.focus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backwards_selection_orders_endpoints() {
        let selection = Selection::range(Position::new(2, 1), Position::new(0, 4));
        assert_eq!(selection.start(), Position::new(0, 4));
        assert_eq!(selection.end(), Position::new(2, 1));
        assert!(!selection.is_collapsed());
    }
}
