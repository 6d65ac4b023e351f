//! Carry document positions across an edit.
//!
//! Both trees are laid out as one run of units: the inline atoms of every
//! text block in document order, each block closed by a block end. A
//! position is a gap in that run. The edit is taken to be the stretch
//! between the common prefix and the common suffix of the two runs, and
//! gaps outside it move with the text around them.

use richdoc_model::Root;

use crate::blocks::{inline_children, node_at, text_block_paths};
use crate::inline::{AtomKind, Inline};
use crate::Position;

/// Which side of text inserted exactly at a position it ends up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bias {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Unit {
    Atom(AtomKind),
    BlockEnd,
}

#[derive(Debug, Default)]
struct Layout {
    units: Vec<Unit>,

    /// Index of each block's first unit
    starts: Vec<usize>,
}

impl Layout {
    fn new(root: &Root) -> Self {
        let mut layout = Layout::default();
        for path in text_block_paths(root) {
            layout.starts.push(layout.units.len());
            if let Some(node) = node_at(root, &path) {
                let inline = Inline::from_nodes(inline_children(node));
                layout
                    .units
                    .extend(inline.atoms().iter().map(|atom| Unit::Atom(atom.kind.clone())));
            }
            layout.units.push(Unit::BlockEnd);
        }
        layout
    }

    fn block_len(&self, block: usize) -> usize {
        let end = self.starts.get(block + 1).copied().unwrap_or(self.units.len());
        end.saturating_sub(self.starts[block] + 1)
    }

    fn gap_of(&self, position: Position) -> usize {
        if self.starts.is_empty() {
            return 0;
        }
        let block = position.block.min(self.starts.len() - 1);
        self.starts[block] + position.offset.min(self.block_len(block))
    }

    fn position_at(&self, gap: usize) -> Position {
        if self.starts.is_empty() {
            return Position::default();
        }
        let block = self.starts.partition_point(|start| *start <= gap).saturating_sub(1);
        let offset = (gap - self.starts[block]).min(self.block_len(block));
        Position::new(block, offset)
    }
}

pub(crate) struct PositionMap {
    before: Layout,
    after: Layout,
    prefix: usize,
    suffix: usize,
}

impl PositionMap {
    pub fn new(before: &Root, after: &Root) -> Self {
        let before = Layout::new(before);
        let after = Layout::new(after);
        let prefix = before
            .units
            .iter()
            .zip(&after.units)
            .take_while(|(old, new)| old == new)
            .count();
        let limit = before.units.len().min(after.units.len()) - prefix;
        let suffix = before.units[prefix..]
            .iter()
            .rev()
            .zip(after.units[prefix..].iter().rev())
            .take(limit)
            .take_while(|(old, new)| old == new)
            .count();

        Self {
            before,
            after,
            prefix,
            suffix,
        }
    }

    pub fn map(&self, position: Position, bias: Bias) -> Position {
        let gap = self.before.gap_of(position);
        let deleted_end = self.before.units.len() - self.suffix;
        let inserted_end = self.after.units.len() - self.suffix;

        let mapped = if gap < self.prefix {
            gap
        } else if gap == self.prefix && self.prefix == deleted_end {
            match bias {
                Bias::Before => gap,
                Bias::After => inserted_end,
            }
        } else if gap == self.prefix {
            gap
        } else if gap >= deleted_end {
            gap - deleted_end + inserted_end
        } else {
            self.prefix + (gap - self.prefix).min(inserted_end - self.prefix)
        };
        self.after.position_at(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richdoc_model::Node;

    fn paragraphs(texts: &[&str]) -> Root {
        Root::new(
            texts
                .iter()
                .map(|text| Node::paragraph(vec![Node::text(*text)]))
                .collect(),
        )
    }

    #[test]
    fn test_split_before_position_moves_it_down() {
        let map = PositionMap::new(&paragraphs(&["a", "xy"]), &paragraphs(&["", "a", "xy"]));
        assert_eq!(map.map(Position::new(1, 1), Bias::Before), Position::new(2, 1));
    }

    #[test]
    fn test_typing_before_position_shifts_offset() {
        let map = PositionMap::new(&paragraphs(&["ab"]), &paragraphs(&["zzab"]));
        assert_eq!(map.map(Position::new(0, 1), Bias::Before), Position::new(0, 3));
        assert_eq!(map.map(Position::new(0, 0), Bias::Before), Position::new(0, 0));
        assert_eq!(map.map(Position::new(0, 0), Bias::After), Position::new(0, 2));
    }

    #[test]
    fn test_edits_after_position_leave_it() {
        let map = PositionMap::new(&paragraphs(&["ab", "cd"]), &paragraphs(&["ab", "c"]));
        assert_eq!(map.map(Position::new(0, 1), Bias::Before), Position::new(0, 1));
    }

    #[test]
    fn test_deleted_text_collapses_to_edit_start() {
        let map = PositionMap::new(&paragraphs(&["abcdef"]), &paragraphs(&["af"]));
        assert_eq!(map.map(Position::new(0, 3), Bias::Before), Position::new(0, 1));
        assert_eq!(map.map(Position::new(0, 6), Bias::Before), Position::new(0, 2));
    }

    #[test]
    fn test_joined_blocks_keep_position_in_text() {
        let map = PositionMap::new(&paragraphs(&["ab", "cd"]), &paragraphs(&["abcd"]));
        assert_eq!(map.map(Position::new(1, 1), Bias::Before), Position::new(0, 3));
    }
}
