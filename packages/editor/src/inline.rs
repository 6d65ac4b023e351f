//! Flat view of a text block's inline content.
//!
//! Nested `Link`/`Text` nodes are awkward to edit at character offsets, so
//! commands work on a sequence of atoms instead: one per character, line
//! break or image, each carrying its format flags and the link it belongs
//! to. [`Inline::to_nodes`] folds the atoms back into the smallest node
//! list: equal adjacent runs merge and consecutive atoms of one link share
//! a single `Link` node.

use richdoc_model::{FormatFlags, Node};
use std::ops::Range;

/// Identity of one link within a block. Two links to the same URL stay
/// distinct because their ids differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkRef {
    pub id: usize,
    pub url: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AtomKind {
    Char(char),
    LineBreak,
    Image { src: String, alt: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Atom {
    pub kind: AtomKind,
    pub format: FormatFlags,
    pub link: Option<LinkRef>,
}

impl Atom {
    pub fn line_break() -> Self {
        Self {
            kind: AtomKind::LineBreak,
            format: FormatFlags::empty(),
            link: None,
        }
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            kind: AtomKind::Image {
                src: src.into(),
                alt: alt.into(),
            },
            format: FormatFlags::empty(),
            link: None,
        }
    }

    fn is_char(&self) -> bool {
        matches!(self.kind, AtomKind::Char(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Inline {
    atoms: Vec<Atom>,
}

impl Inline {
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut inline = Inline::default();
        let mut next_link = 0;
        inline.read(nodes, None, &mut next_link);
        inline
    }

    fn read(&mut self, nodes: &[Node], link: Option<&LinkRef>, next_link: &mut usize) {
        for node in nodes {
            match node {
                Node::Text { content, format } => {
                    self.atoms.extend(content.chars().map(|c| Atom {
                        kind: AtomKind::Char(c),
                        format: *format,
                        link: link.cloned(),
                    }));
                }
                Node::LineBreak => self.atoms.push(Atom {
                    link: link.cloned(),
                    ..Atom::line_break()
                }),
                Node::Image { src, alt } => self.atoms.push(Atom {
                    link: link.cloned(),
                    ..Atom::image(src.as_str(), alt.as_str())
                }),
                Node::Link {
                    url,
                    target,
                    children,
                } => {
                    let link = LinkRef {
                        id: *next_link,
                        url: url.clone(),
                        target: target.clone(),
                    };
                    *next_link += 1;
                    self.read(children, Some(&link), next_link);
                }
                other => {
                    if let Some(children) = other.children() {
                        self.read(children, link, next_link);
                    }
                }
            }
        }
    }

    pub fn to_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut start = 0;

        while start < self.atoms.len() {
            let link = &self.atoms[start].link;
            let end = self.atoms[start..]
                .iter()
                .position(|atom| &atom.link != link)
                .map_or(self.atoms.len(), |len| start + len);

            let run = build_run(&self.atoms[start..end]);
            match link {
                Some(link) => nodes.push(Node::Link {
                    url: link.url.clone(),
                    target: link.target.clone(),
                    children: run,
                }),
                None => nodes.extend(run),
            }
            start = end;
        }

        nodes
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end.min(self.atoms.len());
        range.start.min(end)..end
    }

    pub fn split_off(&mut self, at: usize) -> Inline {
        let at = at.min(self.atoms.len());
        Inline {
            atoms: self.atoms.split_off(at),
        }
    }

    /// Append another block's content, renumbering its links so they stay
    /// distinct from ours.
    pub fn append(&mut self, mut other: Inline) {
        let offset = self.next_link_id();
        for atom in &mut other.atoms {
            if let Some(link) = &mut atom.link {
                link.id += offset;
            }
        }
        self.atoms.append(&mut other.atoms);
    }

    fn next_link_id(&self) -> usize {
        self.atoms
            .iter()
            .filter_map(|atom| atom.link.as_ref().map(|link| link.id + 1))
            .max()
            .unwrap_or(0)
    }

    pub fn new_link(&self, url: impl Into<String>) -> LinkRef {
        LinkRef {
            id: self.next_link_id(),
            url: Some(url.into()),
            target: None,
        }
    }

    /// Insert atoms at `at`, returning the offset just past them.
    pub fn insert(&mut self, at: usize, atoms: Vec<Atom>) -> usize {
        let at = at.min(self.atoms.len());
        let count = atoms.len();
        self.atoms.splice(at..at, atoms);
        at + count
    }

    pub fn insert_text(
        &mut self,
        at: usize,
        text: &str,
        format: FormatFlags,
        link: Option<LinkRef>,
    ) -> usize {
        let atoms = text
            .chars()
            .map(|c| Atom {
                kind: AtomKind::Char(c),
                format,
                link: link.clone(),
            })
            .collect();
        self.insert(at, atoms)
    }

    pub fn delete(&mut self, range: Range<usize>) {
        let range = self.clamp(range);
        self.atoms.drain(range);
    }

    /// Format new text typed at `offset` picks up: that of the character
    /// before it, or after it at the start of a block.
    pub fn format_before(&self, offset: usize) -> FormatFlags {
        let offset = offset.min(self.atoms.len());
        let before = offset.checked_sub(1).and_then(|index| self.atoms.get(index));
        before
            .or_else(|| self.atoms.get(offset))
            .filter(|atom| atom.is_char())
            .map(|atom| atom.format)
            .unwrap_or_default()
    }

    /// The link surrounding `offset` when the caret is strictly inside it.
    pub fn link_inside(&self, offset: usize) -> Option<LinkRef> {
        let before = self.atoms.get(offset.checked_sub(1)?)?;
        let after = self.atoms.get(offset)?;
        match (&before.link, &after.link) {
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            _ => None,
        }
    }

    /// Ids of links covering atoms in `range`. An empty range looks at the
    /// atoms on both sides of the caret.
    pub fn links_touching(&self, range: Range<usize>) -> Vec<usize> {
        let range = if range.is_empty() {
            range.start.saturating_sub(1)..range.start + 1
        } else {
            range
        };
        let range = self.clamp(range);

        let mut ids: Vec<usize> = self.atoms[range]
            .iter()
            .filter_map(|atom| atom.link.as_ref().map(|link| link.id))
            .collect();
        ids.dedup();
        ids
    }

    /// `None` when the range holds no characters, else whether every
    /// character carries `flag`.
    pub fn has_flag(&self, range: Range<usize>, flag: FormatFlags) -> Option<bool> {
        let range = self.clamp(range);
        let mut chars = self.atoms[range].iter().filter(|atom| atom.is_char()).peekable();
        chars.peek()?;
        Some(chars.all(|atom| atom.format.contains(flag)))
    }

    pub fn set_flag(&mut self, range: Range<usize>, flag: FormatFlags, enabled: bool) {
        let range = self.clamp(range);
        for atom in self.atoms[range].iter_mut().filter(|atom| atom.is_char()) {
            atom.format.set(flag, enabled);
        }
    }

    pub fn clear_format(&mut self, range: Range<usize>) {
        let range = self.clamp(range);
        for atom in &mut self.atoms[range] {
            atom.format = FormatFlags::empty();
        }
    }

    pub fn set_link(&mut self, range: Range<usize>, link: Option<LinkRef>) {
        let range = self.clamp(range);
        for atom in &mut self.atoms[range] {
            atom.link = link.clone();
        }
    }

    pub fn update_link(&mut self, id: usize, url: &str) {
        for atom in &mut self.atoms {
            if let Some(link) = atom.link.as_mut().filter(|link| link.id == id) {
                link.url = Some(url.to_string());
            }
        }
    }

    /// Remove the given links entirely, keeping their content.
    pub fn unlink(&mut self, ids: &[usize]) {
        for atom in &mut self.atoms {
            if atom.link.as_ref().is_some_and(|link| ids.contains(&link.id)) {
                atom.link = None;
            }
        }
    }
}

fn build_run(atoms: &[Atom]) -> Vec<Node> {
    let mut nodes: Vec<Node> = Vec::new();

    for atom in atoms {
        match &atom.kind {
            AtomKind::Char(c) => {
                if let Some(Node::Text { content, format }) = nodes.last_mut() {
                    if *format == atom.format {
                        content.push(*c);
                        continue;
                    }
                }
                nodes.push(Node::styled(c.to_string(), atom.format));
            }
            AtomKind::LineBreak => nodes.push(Node::LineBreak),
            AtomKind::Image { src, alt } => nodes.push(Node::image(src.as_str(), alt.as_str())),
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Node> {
        vec![
            Node::text("Hello "),
            Node::styled("bold", FormatFlags::BOLD),
            Node::LineBreak,
            Node::link("/a", vec![Node::text("link")]),
        ]
    }

    #[test]
    fn test_round_trip_preserves_nodes() {
        let nodes = sample();
        let inline = Inline::from_nodes(&nodes);
        assert_eq!(inline.len(), 6 + 4 + 1 + 4);
        assert_eq!(inline.to_nodes(), nodes);
    }

    #[test]
    fn test_adjacent_runs_merge() {
        let mut inline = Inline::from_nodes(&[Node::text("ab")]);
        inline.insert_text(2, "cd", FormatFlags::empty(), None);
        assert_eq!(inline.to_nodes(), vec![Node::text("abcd")]);
    }

    #[test]
    fn test_set_flag_splits_runs() {
        let mut inline = Inline::from_nodes(&[Node::text("abcd")]);
        inline.set_flag(1..3, FormatFlags::ITALIC, true);
        assert_eq!(
            inline.to_nodes(),
            vec![
                Node::text("a"),
                Node::styled("bc", FormatFlags::ITALIC),
                Node::text("d"),
            ]
        );
        assert_eq!(inline.has_flag(1..3, FormatFlags::ITALIC), Some(true));
        assert_eq!(inline.has_flag(0..3, FormatFlags::ITALIC), Some(false));
    }

    #[test]
    fn test_has_flag_ignores_non_text() {
        let inline = Inline::from_nodes(&[Node::LineBreak, Node::image("/a.png", "")]);
        assert_eq!(inline.has_flag(0..2, FormatFlags::BOLD), None);
    }

    #[test]
    fn test_distinct_links_stay_separate() {
        let nodes = vec![
            Node::link("/same", vec![Node::text("a")]),
            Node::link("/same", vec![Node::text("b")]),
        ];
        let inline = Inline::from_nodes(&nodes);
        assert_eq!(inline.to_nodes(), nodes);
    }

    #[test]
    fn test_append_renumbers_links() {
        let mut first = Inline::from_nodes(&[Node::link("/a", vec![Node::text("a")])]);
        let second = Inline::from_nodes(&[Node::link("/a", vec![Node::text("b")])]);
        first.append(second);
        assert_eq!(first.to_nodes().len(), 2);
    }

    #[test]
    fn test_link_inside_and_unlink() {
        let mut inline = Inline::from_nodes(&sample());
        assert!(inline.link_inside(13).is_some());
        assert!(inline.link_inside(11).is_none());

        let ids = inline.links_touching(13..13);
        inline.unlink(&ids);
        assert_eq!(inline.to_nodes().last(), Some(&Node::text("link")));
    }

    #[test]
    fn test_format_before_start_of_block() {
        let inline = Inline::from_nodes(&[Node::styled("x", FormatFlags::CODE)]);
        assert_eq!(inline.format_before(0), FormatFlags::CODE);
        assert_eq!(inline.format_before(1), FormatFlags::CODE);
    }
}
