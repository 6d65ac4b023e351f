//! Addressing nodes by child-index paths.
//!
//! A path lists child indices from the root, so `[2, 0, 1]` is the second
//! child of the first child of the root's third block. Text blocks are
//! numbered in document order; that number is what [`Position::block`]
//! holds.
//!
//! [`Position::block`]: crate::Position

use richdoc_model::{Node, Root};

pub(crate) type Path = Vec<usize>;

/// Paths of every text block, in document order.
pub(crate) fn text_block_paths(root: &Root) -> Vec<Path> {
    let mut paths = Vec::new();
    collect_text_blocks(&root.children, &mut Vec::new(), &mut paths);
    paths
}

fn collect_text_blocks(nodes: &[Node], prefix: &mut Path, out: &mut Vec<Path>) {
    for (index, node) in nodes.iter().enumerate() {
        prefix.push(index);
        if node.is_text_block() {
            out.push(prefix.clone());
            // Items of lists nested in a list item follow the item itself.
            if let Node::ListItem { children, .. } = node {
                collect_text_blocks(children, prefix, out);
            }
        } else if matches!(
            node,
            Node::List { .. } | Node::Table { .. } | Node::TableRow { .. } | Node::TableCell { .. }
        ) {
            if let Some(children) = node.children() {
                collect_text_blocks(children, prefix, out);
            }
        }
        prefix.pop();
    }
}

/// Number of leading inline children of a text block. A list item keeps
/// its nested lists after its inline content.
pub(crate) fn inline_len(children: &[Node]) -> usize {
    children
        .iter()
        .position(|child| !child.is_inline())
        .unwrap_or(children.len())
}

/// The inline part of a text block's children.
pub(crate) fn inline_children(node: &Node) -> &[Node] {
    node.children()
        .map(|children| &children[..inline_len(children)])
        .unwrap_or_default()
}

pub(crate) fn node_at<'a>(root: &'a Root, path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = root.children.get(*first)?;
    for index in rest {
        node = node.children()?.get(*index)?;
    }
    Some(node)
}

pub(crate) fn node_at_mut<'a>(root: &'a mut Root, path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let mut node = root.children.get_mut(*first)?;
    for index in rest {
        node = node.children_mut()?.get_mut(*index)?;
    }
    Some(node)
}

/// Children of the node at `path`; the empty path is the root.
pub(crate) fn children_at_mut<'a>(root: &'a mut Root, path: &[usize]) -> Option<&'a mut Vec<Node>> {
    if path.is_empty() {
        return Some(&mut root.children);
    }
    node_at_mut(root, path)?.children_mut()
}

/// Where a table cell sits: the table's path plus row and column indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CellAddress {
    pub table: Path,
    pub row: usize,
    pub column: usize,
}

impl CellAddress {
    pub fn cell_path(&self, row: usize, column: usize) -> Path {
        let mut path = self.table.clone();
        path.push(row);
        path.push(column);
        path
    }
}

/// The innermost table cell containing the node at `path`.
pub(crate) fn cell_address(root: &Root, path: &[usize]) -> Option<CellAddress> {
    (2..path.len()).rev().find_map(|depth| {
        let cell = node_at(root, &path[..=depth])?;
        let table = node_at(root, &path[..depth - 1])?;
        match (cell, table) {
            (Node::TableCell { .. }, Node::Table { .. }) => Some(CellAddress {
                table: path[..depth - 1].to_vec(),
                row: path[depth - 1],
                column: path[depth],
            }),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use richdoc_model::ListKind;

    fn sample() -> Root {
        Root::new(vec![
            Node::paragraph(vec![Node::text("a")]),
            Node::list(ListKind::Bullet, vec![
                Node::list_item(vec![Node::text("b")]),
                Node::list_item(vec![Node::text("c")]),
            ]),
            Node::table(1, 2),
        ])
    }

    #[test]
    fn test_text_blocks_in_document_order() {
        let paths = text_block_paths(&sample());
        assert_eq!(
            paths,
            vec![
                vec![0],
                vec![1, 0],
                vec![1, 1],
                vec![2, 0, 0, 0],
                vec![2, 0, 1, 0],
            ]
        );
    }

    #[test]
    fn test_nested_items_follow_their_parent() {
        let root = Root::new(vec![Node::list(ListKind::Bullet, vec![
            Node::list_item(vec![
                Node::text("a"),
                Node::list(ListKind::Ordered, vec![Node::list_item(vec![Node::text("a.1")])]),
            ]),
            Node::list_item(vec![Node::text("b")]),
        ])]);
        assert_eq!(
            text_block_paths(&root),
            vec![vec![0, 0], vec![0, 0, 1, 0], vec![0, 1]]
        );
    }

    #[test]
    fn test_inline_len_stops_at_nested_list() {
        let children = vec![
            Node::text("a"),
            Node::LineBreak,
            Node::list(ListKind::Bullet, vec![]),
        ];
        assert_eq!(inline_len(&children), 2);
        assert_eq!(inline_len(&children[..2]), 2);
    }

    #[test]
    fn test_node_lookup() {
        let root = sample();
        assert_eq!(node_at(&root, &[1, 1]).map(Node::plain_text), Some("c".to_string()));
        assert!(node_at(&root, &[5]).is_none());
        assert!(node_at(&root, &[]).is_none());
    }

    #[test]
    fn test_cell_address() {
        let root = sample();
        assert_eq!(
            cell_address(&root, &[2, 0, 1, 0]),
            Some(CellAddress {
                table: vec![2],
                row: 0,
                column: 1,
            })
        );
        assert_eq!(cell_address(&root, &[1, 0]), None);
    }
}
