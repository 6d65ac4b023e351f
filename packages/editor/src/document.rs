//! # Structured document state
//!
//! The tree being edited in structured mode, the selection, and the format
//! pending for the next typed text.
//!
//! The tree is kept canonical (see `normalize`): every text block holds
//! only inline content, except that a list item may end with nested lists.
//! Lists hold only list items, and tables hold rows of cells. The
//! primitives below rely on that shape and preserve it.
//!
//! Block numbering is by document order, so wrapping a block in a list,
//! outdenting a nested item or lifting an item out of its list keeps every
//! [`Position`] valid. Operations
//! that add or remove text blocks return the caret to use afterwards.

use crate::blocks::{
    cell_address, children_at_mut, inline_children, inline_len, node_at, node_at_mut,
    text_block_paths, CellAddress, Path,
};
use crate::inline::{Atom, Inline};
use crate::normalize::canonicalize;
use crate::undo_stack::Snapshot;
use crate::{BlockType, Position, Selection, Side};
use richdoc_model::{Align, FormatFlags, ListKind, Node, Root};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredState {
    pub(crate) root: Root,
    pub(crate) selection: Selection,

    /// Format toggled on a collapsed caret, applied to the next typed text
    pub(crate) pending: Option<FormatFlags>,
}

impl Default for StructuredState {
    fn default() -> Self {
        Self::new(Root::empty())
    }
}

impl StructuredState {
    /// Adopt a tree, bringing it into canonical shape. The caret starts at
    /// the beginning of the document.
    pub fn new(root: Root) -> Self {
        let mut state = Self {
            root: canonicalize(root),
            selection: Selection::default(),
            pending: None,
        };
        state.ensure_text_block();
        state
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn pending_format(&self) -> Option<FormatFlags> {
        self.pending
    }

    pub fn block_count(&self) -> usize {
        self.paths().len()
    }

    /// The text block with document-order index `index`.
    pub fn block(&self, index: usize) -> Option<&Node> {
        self.path(index).and_then(|path| node_at(&self.root, &path))
    }

    pub(crate) fn paths(&self) -> Vec<Path> {
        text_block_paths(&self.root)
    }

    pub(crate) fn path(&self, index: usize) -> Option<Path> {
        self.paths().into_iter().nth(index)
    }

    fn index_of(&self, path: &[usize]) -> Option<usize> {
        self.paths().iter().position(|candidate| candidate.as_slice() == path)
    }

    fn ensure_text_block(&mut self) {
        if self.paths().is_empty() {
            self.root.children.push(Node::paragraph(vec![]));
        }
    }

    pub(crate) fn inline(&self, index: usize) -> Inline {
        self.block(index)
            .map(|node| Inline::from_nodes(inline_children(node)))
            .unwrap_or_default()
    }

    pub(crate) fn set_inline(&mut self, index: usize, inline: &Inline) {
        let Some(path) = self.path(index) else {
            return;
        };
        if let Some(children) = node_at_mut(&mut self.root, &path).and_then(Node::children_mut) {
            let end = inline_len(children);
            children.splice(..end, inline.to_nodes());
        }
    }

    pub(crate) fn block_len(&self, index: usize) -> usize {
        self.inline(index).len()
    }

    pub(crate) fn clamp(&self, position: Position) -> Position {
        let count = self.block_count();
        if count == 0 {
            return Position::default();
        }
        let block = position.block.min(count - 1);
        Position::new(block, position.offset.min(self.block_len(block)))
    }

    pub(crate) fn set_selection(&mut self, selection: Selection) {
        self.selection = Selection::range(self.clamp(selection.anchor), self.clamp(selection.focus));
    }

    pub(crate) fn set_caret(&mut self, position: Position) {
        self.selection = Selection::caret(self.clamp(position));
    }

    pub(crate) fn select_all(&mut self) {
        let last = self.block_count().saturating_sub(1);
        let end = Position::new(last, self.block_len(last));
        self.selection = Selection::range(Position::default(), end);
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            root: self.root.clone(),
            selection: self.selection,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.root = snapshot.root;
        self.pending = None;
        self.ensure_text_block();
        self.set_selection(snapshot.selection);
    }

    /// Character ranges covered by the selection, one per touched block.
    pub(crate) fn selected_ranges(&self) -> Vec<(usize, Range<usize>)> {
        let start = self.clamp(self.selection.start());
        let end = self.clamp(self.selection.end());
        (start.block..=end.block)
            .map(|block| {
                let from = if block == start.block { start.offset } else { 0 };
                let to = if block == end.block {
                    end.offset
                } else {
                    self.block_len(block)
                };
                (block, from..to)
            })
            .collect()
    }

    pub(crate) fn selected_blocks(&self) -> Range<usize> {
        let start = self.clamp(self.selection.start());
        let end = self.clamp(self.selection.end());
        start.block..end.block + 1
    }

    /// Kind of the list holding text block `index`, if it is a list item.
    pub(crate) fn list_kind_of(&self, index: usize) -> Option<ListKind> {
        let path = self.path(index)?;
        let (_, list_path) = path.split_last()?;
        match node_at(&self.root, list_path)? {
            Node::List { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub(crate) fn set_block_align(&mut self, index: usize, align: Option<Align>) {
        if let Some(path) = self.path(index) {
            if let Some(node) = node_at_mut(&mut self.root, &path) {
                node.set_align(align);
            }
        }
    }

    /// Turn text block `index` into `target`. List targets wrap the block
    /// or change the kind of its list; other targets retype the block,
    /// lifting a list item out of its list first.
    pub(crate) fn set_text_block_type(&mut self, index: usize, target: BlockType) {
        let Some(path) = self.path(index) else {
            return;
        };
        let current_kind = self.list_kind_of(index);

        match (target.list_kind(), current_kind) {
            (Some(kind), Some(current)) => {
                if kind != current {
                    self.set_list_kind(&path[..path.len() - 1], kind);
                }
            }
            (Some(kind), None) => self.wrap_in_list(&path, kind),
            (None, Some(_)) => self.lift_list_item(&path, target),
            (None, None) => self.retype(&path, target),
        }
    }

    fn wrap_in_list(&mut self, path: &[usize], kind: ListKind) {
        let Some(slot) = node_at_mut(&mut self.root, path) else {
            return;
        };
        let (align, children) = into_parts(std::mem::replace(slot, Node::paragraph(vec![])));
        *slot = Node::list(kind, vec![Node::ListItem {
            checked: (kind == ListKind::Task).then_some(false),
            align,
            children,
        }]);
    }

    fn set_list_kind(&mut self, list_path: &[usize], target: ListKind) {
        if let Some(Node::List { kind, children }) = node_at_mut(&mut self.root, list_path) {
            *kind = target;
            for item in children.iter_mut() {
                if let Node::ListItem { checked, .. } = item {
                    if target == ListKind::Task {
                        checked.get_or_insert(false);
                    } else {
                        *checked = None;
                    }
                }
            }
        }
    }

    /// Move the list item at `path` out of its list as a `target` block,
    /// splitting the list around it. A nested item is outdented to the top
    /// list first; the item's own nested lists follow the new block.
    fn lift_list_item(&mut self, path: &[usize], target: BlockType) {
        let mut path = path.to_vec();
        while self.outdent_list_item(&path) {
            path.truncate(path.len() - 2);
            if let Some(last) = path.last_mut() {
                *last += 1;
            }
        }

        let Some((&item_index, list_path)) = path.split_last() else {
            return;
        };
        let Some((&list_index, container_path)) = list_path.split_last() else {
            return;
        };
        let Some(container) = children_at_mut(&mut self.root, container_path) else {
            return;
        };
        if !matches!(container.get(list_index), Some(Node::List { .. })) {
            return;
        }

        let Node::List { kind, mut children } = container.remove(list_index) else {
            return;
        };
        if item_index >= children.len() {
            container.insert(list_index, Node::List { kind, children });
            return;
        }

        let after = children.split_off(item_index + 1);
        let item = children.pop();
        let before = children;

        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(Node::list(kind, before));
        }
        if let Some(item) = item {
            let (align, mut content) = into_parts(item);
            let nested = content.split_off(inline_len(&content));
            replacement.push(target.build(align, content));
            replacement.extend(nested);
        }
        if !after.is_empty() {
            replacement.push(Node::list(kind, after));
        }
        container.splice(list_index..list_index, replacement);
        merge_lists_in(container);
    }

    /// Whether the text block at `path` is an item of a list nested in
    /// another list item.
    fn is_nested_item(&self, path: &[usize]) -> bool {
        path.len() >= 4
            && matches!(node_at(&self.root, path), Some(Node::ListItem { .. }))
            && matches!(node_at(&self.root, &path[..path.len() - 2]), Some(Node::ListItem { .. }))
    }

    /// Move a nested list item up one level, after the item that held it.
    /// Its later siblings and the parent's later nested lists move along
    /// under it, so document order is unchanged.
    fn outdent_list_item(&mut self, path: &[usize]) -> bool {
        if !self.is_nested_item(path) {
            return false;
        }
        let depth = path.len();
        let (item_index, sub_index) = (path[depth - 1], path[depth - 2]);
        let parent_path = &path[..depth - 2];
        let outer_path = &path[..depth - 3];
        let parent_index = path[depth - 3];
        let Some(Node::List { kind: outer_kind, .. }) = node_at(&self.root, outer_path) else {
            return false;
        };
        let outer_kind = *outer_kind;

        let Some(parent) = node_at_mut(&mut self.root, parent_path).and_then(Node::children_mut) else {
            return false;
        };
        let in_range = matches!(
            parent.get(sub_index),
            Some(Node::List { children, .. }) if item_index < children.len()
        );
        if !in_range {
            return false;
        }
        let mut trailing = parent.split_off(sub_index);
        let Node::List { kind: sub_kind, children: mut items } = trailing.remove(0) else {
            return false;
        };
        let rest = items.split_off(item_index + 1);
        let Some(mut item) = items.pop() else {
            return false;
        };
        if !items.is_empty() {
            parent.push(Node::list(sub_kind, items));
        }

        if let Node::ListItem { checked, children, .. } = &mut item {
            if !rest.is_empty() {
                children.push(Node::list(sub_kind, rest));
            }
            children.extend(trailing);
            merge_lists_in(children);
            *checked = match outer_kind {
                ListKind::Task => Some(checked.unwrap_or(false)),
                ListKind::Bullet | ListKind::Ordered => None,
            };
        }

        if let Some(Node::List { children: outer, .. }) = node_at_mut(&mut self.root, outer_path) {
            outer.insert(parent_index + 1, item);
        }
        true
    }

    fn retype(&mut self, path: &[usize], target: BlockType) {
        if let Some(slot) = node_at_mut(&mut self.root, path) {
            let (align, children) = into_parts(std::mem::replace(slot, Node::paragraph(vec![])));
            *slot = target.build(align, children);
        }
    }

    /// Join neighbouring lists of the same kind, at the top level, in
    /// every table cell and inside list items.
    pub(crate) fn merge_adjacent_lists(&mut self) {
        merge_lists_in(&mut self.root.children);
    }

    /// Remove the node at `path`. Items nested under a removed list item
    /// take its place. A list left empty goes with it; an empty cell or
    /// document gets a fresh paragraph.
    fn remove_node(&mut self, path: &[usize]) {
        let Some((&index, parent)) = path.split_last() else {
            return;
        };
        let parent_kind = match node_at(&self.root, parent) {
            Some(Node::List { kind, .. }) => Some(*kind),
            _ => None,
        };
        let Some(children) = children_at_mut(&mut self.root, parent) else {
            return;
        };
        if index < children.len() {
            let removed = children.remove(index);
            if let (Some(kind), Node::ListItem { children: content, .. }) = (parent_kind, removed) {
                let promoted = promoted_items(content, kind);
                children.splice(index..index, promoted);
            }
        }
        if !children.is_empty() {
            return;
        }

        if parent.is_empty() {
            self.root.children.push(Node::paragraph(vec![]));
            return;
        }
        match node_at_mut(&mut self.root, parent) {
            Some(Node::List { .. }) => {
                let parent = parent.to_vec();
                self.remove_node(&parent);
            }
            Some(Node::TableCell { children }) => children.push(Node::paragraph(vec![])),
            _ => {}
        }
    }

    /// Insert `node` into the container of the text block at `path`.
    fn insert_sibling(&mut self, path: &[usize], at: usize, node: Node) {
        let Some((_, parent)) = path.split_last() else {
            return;
        };
        if let Some(children) = children_at_mut(&mut self.root, parent) {
            let at = at.min(children.len());
            children.insert(at, node);
        }
    }

    /// Enter at `position`.
    pub(crate) fn split_block_at(&mut self, position: Position) -> Position {
        let position = self.clamp(position);
        let Some(path) = self.path(position.block) else {
            return position;
        };
        let Some(node) = node_at(&self.root, &path) else {
            return position;
        };
        let mut head = self.inline(position.block);

        if matches!(node, Node::ListItem { .. }) && head.is_empty() {
            if !self.outdent_list_item(&path) {
                self.lift_list_item(&path, BlockType::Paragraph);
            }
            return Position::new(position.block, 0);
        }

        let index = path[path.len() - 1];
        let mut sibling = continuation(node, vec![]);
        if position.offset == 0 && !head.is_empty() {
            self.insert_sibling(&path, index, sibling);
        } else {
            // The new block takes the tail and any nested lists.
            let tail = head.split_off(position.offset);
            let nested = take_nested_lists(node_at_mut(&mut self.root, &path));
            if let Some(children) = sibling.children_mut() {
                children.extend(tail.to_nodes());
                children.extend(nested);
            }
            self.set_inline(position.block, &head);
            self.insert_sibling(&path, index + 1, sibling);
        }
        Position::new(position.block + 1, 0)
    }

    /// Backspace at a collapsed caret.
    pub(crate) fn delete_backward_at(&mut self, position: Position) -> Position {
        let position = self.clamp(position);
        if position.offset > 0 {
            let mut inline = self.inline(position.block);
            inline.delete(position.offset - 1..position.offset);
            self.set_inline(position.block, &inline);
            return Position::new(position.block, position.offset - 1);
        }

        let Some(path) = self.path(position.block) else {
            return position;
        };
        match node_at(&self.root, &path) {
            Some(Node::ListItem { .. }) => {
                if !self.outdent_list_item(&path) {
                    self.lift_list_item(&path, BlockType::Paragraph);
                }
                return position;
            }
            Some(Node::Heading { .. } | Node::Quote { .. }) => {
                self.retype(&path, BlockType::Paragraph);
                return position;
            }
            _ => {}
        }

        let Some((&index, parent)) = path.split_last() else {
            return position;
        };
        let Some(previous_index) = index.checked_sub(1) else {
            return position;
        };
        let mut previous_path = parent.to_vec();
        previous_path.push(previous_index);

        match node_at(&self.root, &previous_path) {
            Some(Node::Embed(_)) => {
                self.remove_node(&previous_path);
                position
            }
            Some(node) if node.is_text_block() || matches!(node, Node::List { .. }) => {
                self.merge_into_previous(position.block)
            }
            _ => position,
        }
    }

    /// Append text block `index` to text block `index - 1` and remove it.
    fn merge_into_previous(&mut self, index: usize) -> Position {
        let Some(previous) = index.checked_sub(1) else {
            return Position::new(index, 0);
        };
        let mut head = self.inline(previous);
        let joined_at = head.len();
        head.append(self.inline(index));
        self.set_inline(previous, &head);
        if let Some(path) = self.path(index) {
            self.remove_node(&path);
        }
        Position::new(previous, joined_at)
    }

    /// Remove the selected content, joining the first and last blocks when
    /// both sit outside tables. Returns the collapsed caret.
    pub(crate) fn delete_selection(&mut self) -> Position {
        let start = self.clamp(self.selection.start());
        let end = self.clamp(self.selection.end());
        if start == end {
            return start;
        }

        if start.block == end.block {
            let mut inline = self.inline(start.block);
            inline.delete(start.offset..end.offset);
            self.set_inline(start.block, &inline);
            return start;
        }

        let (Some(start_path), Some(end_path)) = (self.path(start.block), self.path(end.block)) else {
            return start;
        };
        let in_table = cell_address(&self.root, &start_path).is_some()
            || cell_address(&self.root, &end_path).is_some();
        if in_table {
            for (block, range) in self.selected_ranges() {
                let mut inline = self.inline(block);
                inline.delete(range);
                self.set_inline(block, &inline);
            }
            return start;
        }

        let mut head = self.inline(start.block);
        head.delete(start.offset..head.len());
        let tail = self.inline(end.block).split_off(end.offset);
        head.append(tail);
        self.set_inline(start.block, &head);

        // Top-level nodes strictly between the two blocks go wholesale.
        let (first_top, last_top) = (start_path[0], end_path[0]);
        let mut end_path = end_path;
        if last_top > first_top + 1 {
            self.root.children.drain(first_top + 1..last_top);
            end_path[0] = first_top + 1;
        }

        let last = self.index_of(&end_path).unwrap_or(start.block);
        for block in (start.block + 1..=last).rev() {
            if let Some(path) = self.path(block) {
                self.remove_node(&path);
            }
        }
        self.merge_adjacent_lists();
        start
    }

    pub(crate) fn insert_image_at(&mut self, position: Position, src: &str, alt: &str) -> Position {
        let position = self.clamp(position);
        let mut inline = self.inline(position.block);
        let offset = inline.insert(position.offset, vec![Atom::image(src, alt)]);
        self.set_inline(position.block, &inline);
        Position::new(position.block, offset)
    }

    /// Insert a block after the top-level block holding the caret,
    /// returning its index in the root.
    pub(crate) fn insert_after_caret_block(&mut self, node: Node) -> usize {
        let caret = self.clamp(self.selection.focus);
        let top = self
            .path(caret.block)
            .and_then(|path| path.first().copied())
            .map_or(self.root.children.len(), |top| top + 1);
        let top = top.min(self.root.children.len());
        self.root.children.insert(top, node);
        top
    }

    /// First text block inside the top-level node `top`.
    pub(crate) fn first_block_in(&self, top: usize) -> Option<usize> {
        self.paths().iter().position(|path| path.first() == Some(&top))
    }

    pub(crate) fn insert_row(&mut self, side: Side) -> bool {
        let Some((_, path, address)) = self.caret_cell() else {
            return false;
        };
        let Some(Node::Table { children: rows }) = node_at_mut(&mut self.root, &address.table) else {
            return false;
        };
        let columns = rows
            .get(address.row)
            .and_then(Node::children)
            .map_or(1, Vec::len)
            .max(1);
        let at = match side {
            Side::Before => address.row,
            Side::After => address.row + 1,
        };
        rows.insert(at, Node::TableRow {
            header: false,
            children: (0..columns).map(|_| Node::table_cell()).collect(),
        });

        let mut caret_path = path;
        if side == Side::Before {
            caret_path[address.table.len()] += 1;
        }
        self.move_caret_to(&caret_path);
        true
    }

    pub(crate) fn insert_column(&mut self, side: Side) -> bool {
        let Some((_, path, address)) = self.caret_cell() else {
            return false;
        };
        let Some(Node::Table { children: rows }) = node_at_mut(&mut self.root, &address.table) else {
            return false;
        };
        let at = match side {
            Side::Before => address.column,
            Side::After => address.column + 1,
        };
        for row in rows.iter_mut() {
            if let Some(cells) = row.children_mut() {
                let at = at.min(cells.len());
                cells.insert(at, Node::table_cell());
            }
        }

        let mut caret_path = path;
        if side == Side::Before {
            caret_path[address.table.len() + 1] += 1;
        }
        self.move_caret_to(&caret_path);
        true
    }

    pub(crate) fn delete_row(&mut self) -> bool {
        let Some((block, _, address)) = self.caret_cell() else {
            return false;
        };
        let first = self.first_block_in_path(&address.table).unwrap_or(block);
        let Some(Node::Table { children: rows }) = node_at_mut(&mut self.root, &address.table) else {
            return false;
        };
        if address.row < rows.len() {
            rows.remove(address.row);
        }

        if rows.is_empty() {
            self.remove_table(&address.table, first);
        } else {
            let row = address.row.min(rows.len() - 1);
            self.move_caret_to(&address.cell_path(row, address.column));
        }
        true
    }

    pub(crate) fn delete_column(&mut self) -> bool {
        let Some((block, _, address)) = self.caret_cell() else {
            return false;
        };
        let first = self.first_block_in_path(&address.table).unwrap_or(block);
        let Some(Node::Table { children: rows }) = node_at_mut(&mut self.root, &address.table) else {
            return false;
        };
        for row in rows.iter_mut() {
            if let Some(cells) = row.children_mut() {
                if address.column < cells.len() {
                    cells.remove(address.column);
                }
            }
        }
        rows.retain(|row| row.children().is_some_and(|cells| !cells.is_empty()));

        if rows.is_empty() {
            self.remove_table(&address.table, first);
        } else {
            let row = address.row.min(rows.len() - 1);
            let column = address.column.min(table_columns(rows, row).saturating_sub(1));
            self.move_caret_to(&address.cell_path(row, column));
        }
        true
    }

    fn remove_table(&mut self, table: &[usize], first_block: usize) {
        self.remove_node(table);
        self.ensure_text_block();
        self.set_caret(Position::new(first_block, 0));
    }

    fn caret_cell(&self) -> Option<(usize, Path, CellAddress)> {
        let caret = self.clamp(self.selection.focus);
        let path = self.path(caret.block)?;
        let address = cell_address(&self.root, &path)?;
        Some((caret.block, path, address))
    }

    fn first_block_in_path(&self, prefix: &[usize]) -> Option<usize> {
        self.paths().iter().position(|path| path.starts_with(prefix))
    }

    /// Put the caret at the start of the first text block at or under `path`.
    fn move_caret_to(&mut self, path: &[usize]) {
        let index = self
            .first_block_in_path(path)
            .or_else(|| {
                let parent = path.get(..path.len().saturating_sub(1)).unwrap_or(path);
                self.first_block_in_path(parent)
            })
            .unwrap_or(0);
        self.set_caret(Position::new(index, 0));
    }
}

fn table_columns(rows: &[Node], row: usize) -> usize {
    rows.get(row)
        .and_then(Node::children)
        .map_or(0, Vec::len)
}

fn into_parts(node: Node) -> (Option<Align>, Vec<Node>) {
    let align = node.align();
    match node {
        Node::Paragraph { children, .. }
        | Node::Heading { children, .. }
        | Node::Quote { children, .. }
        | Node::ListItem { children, .. } => (align, children),
        other => (None, other.children().cloned().unwrap_or_default()),
    }
}

/// The block Enter creates next to `node`.
fn continuation(node: &Node, children: Vec<Node>) -> Node {
    match node {
        Node::Quote { align, .. } => Node::Quote {
            align: *align,
            children,
        },
        Node::ListItem { checked, align, .. } => Node::ListItem {
            checked: checked.map(|_| false),
            align: *align,
            children,
        },
        other => Node::Paragraph {
            align: other.align(),
            children,
        },
    }
}

/// Split the nested lists off a list item.
fn take_nested_lists(node: Option<&mut Node>) -> Vec<Node> {
    match node {
        Some(Node::ListItem { children, .. }) => children.split_off(inline_len(children)),
        _ => Vec::new(),
    }
}

/// Items of the lists nested in a removed item, fitted to a list of `kind`.
fn promoted_items(content: Vec<Node>, kind: ListKind) -> Vec<Node> {
    content
        .into_iter()
        .filter_map(|node| match node {
            Node::List { children, .. } => Some(children),
            _ => None,
        })
        .flatten()
        .map(|mut item| {
            if let Node::ListItem { checked, .. } = &mut item {
                *checked = match kind {
                    ListKind::Task => Some(checked.unwrap_or(false)),
                    ListKind::Bullet | ListKind::Ordered => None,
                };
            }
            item
        })
        .collect()
}

fn merge_lists_in(nodes: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        match &mut node {
            Node::Table { children: rows } => {
                for row in rows.iter_mut() {
                    for cell in row.children_mut().into_iter().flatten() {
                        if let Some(children) = cell.children_mut() {
                            merge_lists_in(children);
                        }
                    }
                }
            }
            Node::List { children: items, .. } => {
                for item in items.iter_mut() {
                    if let Some(children) = item.children_mut() {
                        merge_lists_in(children);
                    }
                }
            }
            _ => {}
        }

        if let (Some(Node::List { kind: previous, children: items }), Node::List { kind, children }) =
            (merged.last_mut(), &mut node)
        {
            if previous == kind {
                items.append(children);
                continue;
            }
        }
        merged.push(node);
    }
    *nodes = merged;
}
