//! Shape documents into the form the editor edits.
//!
//! Stored documents may nest blocks inside text blocks, wrap content in
//! unknown nodes or leave inline content directly under the root. The
//! editor works on a stricter shape:
//!
//! - the root, table cells and nothing else hold blocks
//! - text blocks (paragraph, heading, quote, list item) hold only inline nodes
//! - a list item may end with nested lists, after its inline content
//! - links hold only text, line breaks and images
//! - lists hold only list items, tables only rows, rows only cells
//! - a root or cell is never empty

use richdoc_model::{Align, ListKind, Node, Root};

pub(crate) fn canonicalize(root: Root) -> Root {
    Root::new(non_empty(canonical_blocks(root.children)))
}

fn non_empty(mut blocks: Vec<Node>) -> Vec<Node> {
    if blocks.is_empty() {
        blocks.push(Node::paragraph(vec![]));
    }
    blocks
}

fn canonical_blocks(nodes: Vec<Node>) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut inline = Vec::new();
    for node in nodes {
        push_block(node, &mut blocks, &mut inline);
    }
    flush_paragraph(&mut inline, &mut blocks);
    blocks
}

fn push_block(node: Node, blocks: &mut Vec<Node>, inline: &mut Vec<Node>) {
    if node.is_inline() {
        inline.extend(canonical_inline(node));
        return;
    }
    flush_paragraph(inline, blocks);

    match node {
        Node::Paragraph { align, children } => {
            let (content, hoisted) = split_content(children, false);
            blocks.push(Node::Paragraph {
                align,
                children: content,
            });
            blocks.extend(canonical_blocks(hoisted));
        }
        Node::Heading {
            level,
            align,
            children,
        } => {
            let (content, hoisted) = split_content(children, false);
            blocks.push(Node::Heading {
                level,
                align,
                children: content,
            });
            blocks.extend(canonical_blocks(hoisted));
        }
        Node::Quote { align, children } => {
            let (content, hoisted) = split_content(children, true);
            blocks.push(Node::Quote {
                align,
                children: content,
            });
            blocks.extend(canonical_blocks(hoisted));
        }
        Node::List { kind, children } => blocks.extend(canonical_list(kind, children)),
        // A list item outside a list becomes a single-item list.
        item @ Node::ListItem { .. } => {
            blocks.extend(canonical_list(ListKind::Bullet, vec![item]))
        }
        Node::Table { children } => blocks.extend(canonical_table(children)),
        part @ (Node::TableRow { .. } | Node::TableCell { .. }) => {
            blocks.extend(canonical_table(vec![part]))
        }
        embed @ Node::Embed(_) => blocks.push(embed),
        Node::Unknown { children, .. } => {
            for child in children {
                push_block(child, blocks, inline);
            }
        }
        // Inline nodes returned above.
        Node::Text { .. } | Node::Link { .. } | Node::LineBreak | Node::Image { .. } => {}
    }
}

fn flush_paragraph(inline: &mut Vec<Node>, blocks: &mut Vec<Node>) {
    if inline.is_empty() {
        return;
    }
    let run = std::mem::take(inline);
    if run.iter().all(is_blank_text) {
        return;
    }
    blocks.push(Node::paragraph(run));
}

fn is_blank_text(node: &Node) -> bool {
    matches!(node, Node::Text { content, .. } if content.trim().is_empty())
}

/// Split a text block's children into inline content and blocks that must
/// move out after it. With `merge_text_blocks`, nested text blocks are
/// folded into the content separated by line breaks.
fn split_content(children: Vec<Node>, merge_text_blocks: bool) -> (Vec<Node>, Vec<Node>) {
    let mut content = Vec::new();
    let mut hoisted = Vec::new();
    collect_content(children, merge_text_blocks, &mut content, &mut hoisted);
    (content, hoisted)
}

fn collect_content(
    children: Vec<Node>,
    merge_text_blocks: bool,
    content: &mut Vec<Node>,
    hoisted: &mut Vec<Node>,
) {
    for child in children {
        match child {
            inline if inline.is_inline() => content.extend(canonical_inline(inline)),
            Node::Unknown { children, .. } => {
                collect_content(children, merge_text_blocks, content, hoisted)
            }
            Node::Paragraph { children, .. }
            | Node::Heading { children, .. }
            | Node::Quote { children, .. }
                if merge_text_blocks =>
            {
                if !content.is_empty() {
                    content.push(Node::LineBreak);
                }
                collect_content(children, merge_text_blocks, content, hoisted);
            }
            block => hoisted.push(block),
        }
    }
}

/// Inline content with links flattened to a single level.
fn canonical_inline(node: Node) -> Vec<Node> {
    match node {
        Node::Text { ref content, .. } if content.is_empty() => vec![],
        Node::Link {
            url,
            target,
            children,
        } => {
            let mut inner = Vec::new();
            flatten_link_content(children, &mut inner);
            if inner.is_empty() {
                return vec![];
            }
            vec![Node::Link {
                url,
                target,
                children: inner,
            }]
        }
        other => vec![other],
    }
}

fn flatten_link_content(children: Vec<Node>, out: &mut Vec<Node>) {
    for child in children {
        match child {
            Node::Text { ref content, .. } if content.is_empty() => {}
            leaf @ (Node::Text { .. } | Node::LineBreak | Node::Image { .. }) => out.push(leaf),
            mut other => {
                if let Some(children) = other.children_mut() {
                    flatten_link_content(std::mem::take(children), out);
                }
            }
        }
    }
}

fn canonical_list(kind: ListKind, children: Vec<Node>) -> Vec<Node> {
    let mut builder = ListBuilder {
        kind,
        items: Vec::new(),
        out: Vec::new(),
    };
    builder.extend(children);
    builder.finish()
}

struct ListBuilder {
    kind: ListKind,
    items: Vec<Node>,
    out: Vec<Node>,
}

impl ListBuilder {
    fn extend(&mut self, children: Vec<Node>) {
        for child in children {
            self.push(child);
        }
    }

    fn push(&mut self, child: Node) {
        match child {
            Node::ListItem {
                checked,
                align,
                children,
            } => {
                let (mut content, hoisted) = split_content(children, true);
                let mut after = Vec::new();
                for block in hoisted {
                    match block {
                        Node::List { kind, children } => {
                            for node in canonical_list(kind, children) {
                                match node {
                                    list @ Node::List { .. } => content.push(list),
                                    other => after.push(other),
                                }
                            }
                        }
                        other => after.push(other),
                    }
                }
                join_lists(&mut content);
                self.push_item(checked, align, content);
                for block in after {
                    self.push(block);
                }
            }
            // A list directly inside a list nests under the item before it.
            Node::List { kind, children } => {
                for node in canonical_list(kind, children) {
                    match node {
                        list @ Node::List { .. } => self.nest(list),
                        other => {
                            self.close();
                            self.out.push(other);
                        }
                    }
                }
            }
            Node::Paragraph { align, children }
            | Node::Heading {
                align, children, ..
            }
            | Node::Quote { align, children } => {
                let (content, hoisted) = split_content(children, true);
                self.push_item(None, align, content);
                for block in hoisted {
                    self.push(block);
                }
            }
            Node::Unknown { children, .. } => self.extend(children),
            inline if inline.is_inline() => {
                if !is_blank_text(&inline) {
                    let content = canonical_inline(inline);
                    self.push_item(None, None, content);
                }
            }
            // Tables and embeds cannot live in a list: close it around them.
            other => {
                self.close();
                self.out.extend(canonical_blocks(vec![other]));
            }
        }
    }

    fn push_item(
        &mut self,
        checked: Option<bool>,
        align: Option<Align>,
        children: Vec<Node>,
    ) {
        let checked = match self.kind {
            ListKind::Task => Some(checked.unwrap_or(false)),
            ListKind::Bullet | ListKind::Ordered => None,
        };
        self.items.push(Node::ListItem {
            checked,
            align,
            children,
        });
    }

    fn nest(&mut self, list: Node) {
        if self.items.is_empty() {
            self.push_item(None, None, vec![]);
        }
        if let Some(children) = self.items.last_mut().and_then(Node::children_mut) {
            children.push(list);
            join_lists(children);
        }
    }

    fn close(&mut self) {
        if !self.items.is_empty() {
            let items = std::mem::take(&mut self.items);
            self.out.push(Node::list(self.kind, items));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.close();
        self.out
    }
}

/// Join neighbouring lists of the same kind.
fn join_lists(nodes: &mut Vec<Node>) {
    let mut joined: Vec<Node> = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        if let (Some(Node::List { kind: previous, children: items }), Node::List { kind, children }) =
            (joined.last_mut(), &mut node)
        {
            if previous == kind {
                items.append(children);
                continue;
            }
        }
        joined.push(node);
    }
    *nodes = joined;
}

fn canonical_table(children: Vec<Node>) -> Option<Node> {
    let mut rows = Vec::new();
    collect_rows(children, &mut rows);
    if rows.is_empty() {
        return None;
    }
    Some(Node::Table { children: rows })
}

fn collect_rows(children: Vec<Node>, rows: &mut Vec<Node>) {
    let mut loose_cells = Vec::new();

    for child in children {
        match child {
            Node::TableRow { header, children } => {
                let mut cells = Vec::new();
                collect_cells(children, &mut cells);
                if !cells.is_empty() {
                    rows.push(Node::TableRow {
                        header,
                        children: cells,
                    });
                }
            }
            Node::TableCell { children } => loose_cells.push(canonical_cell(children)),
            Node::Unknown { children, .. } => collect_rows(children, rows),
            _ => {}
        }
    }

    if !loose_cells.is_empty() {
        rows.push(Node::TableRow {
            header: false,
            children: loose_cells,
        });
    }
}

fn collect_cells(children: Vec<Node>, cells: &mut Vec<Node>) {
    for child in children {
        match child {
            Node::TableCell { children } => cells.push(canonical_cell(children)),
            Node::Unknown { children, .. } => collect_cells(children, cells),
            _ => {}
        }
    }
}

fn canonical_cell(children: Vec<Node>) -> Node {
    Node::TableCell {
        children: non_empty(canonical_blocks(children)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richdoc_model::{FormatFlags, HeadingLevel};

    #[test]
    fn test_empty_root_gets_paragraph() {
        assert_eq!(canonicalize(Root::new(vec![])), Root::empty());
    }

    #[test]
    fn test_stray_inline_is_wrapped() {
        let root = canonicalize(Root::new(vec![Node::text("a"), Node::LineBreak]));
        assert_eq!(
            root.children,
            vec![Node::paragraph(vec![Node::text("a"), Node::LineBreak])]
        );
    }

    #[test]
    fn test_unknown_wrappers_are_flattened() {
        let root = canonicalize(Root::new(vec![Node::Unknown {
            kind: Some("section".to_string()),
            children: vec![Node::heading(HeadingLevel::H1, vec![Node::Unknown {
                kind: Some("span".to_string()),
                children: vec![Node::styled("x", FormatFlags::BOLD)],
            }])],
        }]));

        assert_eq!(
            root.children,
            vec![Node::heading(HeadingLevel::H1, vec![Node::styled("x", FormatFlags::BOLD)])]
        );
    }

    #[test]
    fn test_quote_paragraphs_merge_with_breaks() {
        let root = canonicalize(Root::new(vec![Node::quote(vec![
            Node::paragraph(vec![Node::text("one")]),
            Node::paragraph(vec![Node::text("two")]),
        ])]));

        assert_eq!(
            root.children,
            vec![Node::quote(vec![Node::text("one"), Node::LineBreak, Node::text("two")])]
        );
    }

    #[test]
    fn test_nested_list_is_kept() {
        let nested = Root::new(vec![Node::list(ListKind::Bullet, vec![Node::list_item(vec![
            Node::text("outer"),
            Node::list(ListKind::Ordered, vec![Node::list_item(vec![Node::text("inner")])]),
        ])])]);
        assert_eq!(canonicalize(nested.clone()), nested);
    }

    #[test]
    fn test_list_inside_list_nests_under_previous_item() {
        let root = canonicalize(Root::new(vec![Node::list(ListKind::Bullet, vec![
            Node::list_item(vec![Node::text("a")]),
            Node::list(ListKind::Task, vec![Node::list_item(vec![Node::text("b")])]),
        ])]));

        assert_eq!(
            root.children,
            vec![Node::list(ListKind::Bullet, vec![Node::list_item(vec![
                Node::text("a"),
                Node::list(ListKind::Task, vec![Node::ListItem {
                    checked: Some(false),
                    align: None,
                    children: vec![Node::text("b")],
                }]),
            ])])]
        );
    }

    #[test]
    fn test_nested_paragraph_after_list_moves_out() {
        let root = canonicalize(Root::new(vec![Node::list(ListKind::Bullet, vec![Node::list_item(vec![
            Node::text("a"),
            Node::list(ListKind::Bullet, vec![Node::list_item(vec![Node::text("b")])]),
            Node::table(1, 1),
        ])])]));

        assert_eq!(
            root.children,
            vec![
                Node::list(ListKind::Bullet, vec![Node::list_item(vec![
                    Node::text("a"),
                    Node::list(ListKind::Bullet, vec![Node::list_item(vec![Node::text("b")])]),
                ])]),
                Node::table(1, 1),
            ]
        );
    }

    #[test]
    fn test_task_items_get_checked_state() {
        let root = canonicalize(Root::new(vec![Node::list(ListKind::Task, vec![Node::list_item(vec![])])]));
        assert!(matches!(
            &root.children[0],
            Node::List { children, .. } if matches!(children[0], Node::ListItem { checked: Some(false), .. })
        ));
    }

    #[test]
    fn test_empty_cells_get_paragraph() {
        let root = canonicalize(Root::new(vec![Node::Table {
            children: vec![Node::TableRow {
                header: true,
                children: vec![Node::TableCell { children: vec![] }],
            }],
        }]));
        assert_eq!(root.children, vec![Node::table(1, 1)]);
    }

    #[test]
    fn test_nested_links_are_flattened() {
        let root = canonicalize(Root::new(vec![Node::paragraph(vec![Node::link(
            "/outer",
            vec![Node::link("/inner", vec![Node::text("x")])],
        )])]));
        assert_eq!(
            root.children,
            vec![Node::paragraph(vec![Node::link("/outer", vec![Node::text("x")])])]
        );
    }

    #[test]
    fn test_canonical_document_is_stable() {
        let root = canonicalize(Root::new(vec![
            Node::paragraph(vec![Node::text("p")]),
            Node::list(ListKind::Ordered, vec![Node::list_item(vec![Node::text("i")])]),
            Node::table(2, 2),
        ]));
        assert_eq!(canonicalize(root.clone()), root);
    }
}
