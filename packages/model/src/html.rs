//! HTML reader.
//!
//! Turns an HTML fragment back into a [`Root`]. Markup the serializer emits
//! maps back onto the same nodes; anything else degrades the same way the
//! serializer does: unknown elements disappear and their content stays.

use crate::ast::{Align, FormatFlags, HeadingLevel, ListKind, Node, Root, VideoEmbed};
use crate::tokenizer::{close_tag_name, decode_entities, parse_start_tag, tokenize, StartTag, Token};
use tracing::{debug, instrument};

/// Parse an HTML fragment into a document tree. Never fails.
#[instrument(skip(source), fields(len = source.len()))]
pub fn parse_html(source: &str) -> Root {
    let mut builder = TreeBuilder::new();

    for (token, _span) in tokenize(source) {
        match token {
            Token::OpenTag(raw) => builder.open(parse_start_tag(raw)),
            Token::CloseTag(raw) => builder.close(&close_tag_name(raw)),
            Token::Text(raw) => builder.text(&decode_entities(raw)),
            Token::Comment | Token::Declaration | Token::ProcessingInstruction => {}
        }
    }

    let root = builder.finish();
    debug!(blocks = root.children.len(), "Parsed HTML fragment");
    root
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "head", "title", "template"];

enum Frame {
    /// An element that becomes a node; its children accumulate in place.
    Node { tag: String, node: Node },
    /// An inline formatting element contributing flags to text beneath it.
    Format { tag: String, flags: FormatFlags },
    /// An element whose content is kept but which produces no node.
    Transparent { tag: String },
    /// An element whose content is dropped entirely.
    Skip { tag: String },
}

impl Frame {
    fn tag(&self) -> &str {
        match self {
            Frame::Node { tag, .. }
            | Frame::Format { tag, .. }
            | Frame::Transparent { tag }
            | Frame::Skip { tag } => tag,
        }
    }
}

struct TreeBuilder {
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::Node {
                tag: String::new(),
                node: Node::Unknown {
                    kind: Some("root".to_string()),
                    children: vec![],
                },
            }],
        }
    }

    fn skipping(&self) -> bool {
        self.stack.iter().any(|frame| matches!(frame, Frame::Skip { .. }))
    }

    fn flags(&self) -> FormatFlags {
        self.stack
            .iter()
            .filter_map(|frame| match frame {
                Frame::Format { flags, .. } => Some(*flags),
                _ => None,
            })
            .fold(FormatFlags::empty(), |acc, flags| acc | flags)
    }

    /// The innermost node under construction.
    fn current_node(&mut self) -> &mut Node {
        let index = self.current_node_index();
        match &mut self.stack[index] {
            Frame::Node { node, .. } => node,
            _ => unreachable!("current_node_index only returns node frames"),
        }
    }

    fn current_node_index(&self) -> usize {
        self.stack
            .iter()
            .rposition(|frame| matches!(frame, Frame::Node { .. }))
            .unwrap_or(0)
    }

    fn push_child(&mut self, child: Node) {
        if let Some(children) = self.current_node().children_mut() {
            children.push(child);
        }
    }

    fn text(&mut self, text: &str) {
        if self.skipping() || text.is_empty() {
            return;
        }
        let format = self.flags();
        self.push_child(Node::styled(text, format));
    }

    fn open(&mut self, tag: StartTag) {
        if self.skipping() {
            if !VOID_ELEMENTS.contains(&tag.name.as_str()) && !tag.self_closing {
                self.stack.push(Frame::Skip { tag: tag.name });
            }
            return;
        }

        match tag.name.as_str() {
            "br" => return self.push_child(Node::LineBreak),
            "img" => {
                let image = Node::image(tag.attr("src").unwrap_or_default(), tag.attr("alt").unwrap_or_default());
                return self.push_child(image);
            }
            "iframe" => {
                if let Some(src) = tag.attr("src") {
                    if let Node::Embed(embed) = self.current_node() {
                        embed.src = src.to_string();
                    }
                }
            }
            name if VOID_ELEMENTS.contains(&name) => return,
            _ => {}
        }

        let name = tag.name.clone();
        let frame = match tag.name.as_str() {
            "p" => {
                // Paragraphs inside quotes and list items merge into them.
                if matches!(self.current_node(), Node::Quote { .. } | Node::ListItem { .. }) {
                    Frame::Transparent { tag: name }
                } else {
                    self.close_open_text_block();
                    Frame::Node {
                        tag: name,
                        node: Node::Paragraph {
                            align: style_align(&tag),
                            children: vec![],
                        },
                    }
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.close_open_text_block();
                Frame::Node {
                    node: Node::Heading {
                        level: HeadingLevel::from_tag(&name).unwrap_or_default(),
                        align: style_align(&tag),
                        children: vec![],
                    },
                    tag: name,
                }
            }
            "blockquote" => {
                self.close_open_text_block();
                Frame::Node {
                    tag: name,
                    node: Node::Quote {
                        align: style_align(&tag),
                        children: vec![],
                    },
                }
            }
            "ul" | "ol" => {
                if !matches!(self.current_node(), Node::ListItem { .. }) {
                    self.close_open_text_block();
                }
                let kind = if name == "ol" {
                    ListKind::Ordered
                } else if tag.attr("data-type") == Some("taskList") {
                    ListKind::Task
                } else {
                    ListKind::Bullet
                };
                Frame::Node {
                    tag: name,
                    node: Node::list(kind, vec![]),
                }
            }
            "li" => {
                if matches!(self.current_node(), Node::ListItem { .. }) {
                    self.close_through_node();
                }
                Frame::Node {
                    tag: name,
                    node: Node::ListItem {
                        checked: tag.attr("data-checked").map(|value| value == "true"),
                        align: style_align(&tag),
                        children: vec![],
                    },
                }
            }
            "a" => Frame::Node {
                tag: name,
                node: Node::Link {
                    url: tag.attr("href").map(str::to_string),
                    target: tag.attr("target").map(str::to_string),
                    children: vec![],
                },
            },
            "table" => {
                self.close_open_text_block();
                Frame::Node {
                    tag: name,
                    node: Node::Table { children: vec![] },
                }
            }
            "tr" => Frame::Node {
                tag: name,
                node: Node::TableRow {
                    header: false,
                    children: vec![],
                },
            },
            "td" | "th" => Frame::Node {
                tag: name,
                node: Node::TableCell { children: vec![] },
            },
            "div" if tag.attr("data-video-embed").is_some() => {
                self.close_open_text_block();
                Frame::Node {
                    tag: name,
                    node: Node::Embed(VideoEmbed {
                        provider: tag.attr("data-video-embed").unwrap_or_default().to_string(),
                        video_id: tag.attr("data-video-id").unwrap_or_default().to_string(),
                        src: String::new(),
                    }),
                }
            }
            "strong" | "b" => Frame::Format { tag: name, flags: FormatFlags::BOLD },
            "em" | "i" => Frame::Format { tag: name, flags: FormatFlags::ITALIC },
            "u" => Frame::Format { tag: name, flags: FormatFlags::UNDERLINE },
            "s" | "strike" | "del" => Frame::Format {
                tag: name,
                flags: FormatFlags::STRIKETHROUGH,
            },
            "code" => Frame::Format { tag: name, flags: FormatFlags::CODE },
            skipped if SKIPPED_ELEMENTS.contains(&skipped) => Frame::Skip { tag: name },
            _ => Frame::Transparent { tag: name },
        };

        if tag.self_closing {
            // `<p/>` and similar: open and close immediately.
            self.stack.push(frame);
            self.pop_frame();
        } else {
            self.stack.push(frame);
        }
    }

    fn close(&mut self, name: &str) {
        let Some(index) = self.stack.iter().rposition(|frame| frame.tag() == name) else {
            return;
        };
        if index == 0 {
            return;
        }
        while self.stack.len() > index {
            self.pop_frame();
        }
    }

    /// Close an open paragraph or heading before a new block starts.
    fn close_open_text_block(&mut self) {
        let index = self.current_node_index();
        if let Frame::Node { node: Node::Paragraph { .. } | Node::Heading { .. }, .. } = &self.stack[index] {
            while self.stack.len() > index {
                self.pop_frame();
            }
        }
    }

    fn close_through_node(&mut self) {
        let index = self.current_node_index();
        if index == 0 {
            return;
        }
        while self.stack.len() > index {
            self.pop_frame();
        }
    }

    fn pop_frame(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if let Frame::Node { tag, mut node } = frame {
            normalize(&mut node);
            let header_cell = tag == "th";
            let parent = self.current_node();
            if header_cell {
                if let Node::TableRow { header, .. } = &mut *parent {
                    *header = true;
                }
            }
            if let Some(children) = parent.children_mut() {
                children.push(node);
            }
        }
    }

    fn finish(mut self) -> Root {
        while self.stack.len() > 1 {
            self.pop_frame();
        }
        let children = match self.stack.pop() {
            Some(Frame::Node { node: Node::Unknown { children, .. }, .. }) => children,
            _ => vec![],
        };
        Root::new(normalize_blocks(children))
    }
}

fn style_align(tag: &StartTag) -> Option<Align> {
    let style = tag.attr("style")?;
    style.split(';').find_map(|declaration| {
        let (property, value) = declaration.split_once(':')?;
        if property.trim().eq_ignore_ascii_case("text-align") {
            Align::parse(value)
        } else {
            None
        }
    })
}

fn is_blank_text(node: &Node) -> bool {
    matches!(node, Node::Text { content, .. } if content.trim().is_empty())
}

/// Fix up a finished node so it fits the tree shape the editor expects.
fn normalize(node: &mut Node) {
    match node {
        Node::TableCell { children } => {
            let taken = std::mem::take(children);
            *children = normalize_blocks(taken);
            if children.is_empty() {
                children.push(Node::paragraph(vec![]));
            }
        }
        Node::List { children, .. } => {
            let taken = std::mem::take(children);
            *children = normalize_items(taken);
        }
        Node::Table { children } => {
            children.retain(|child| matches!(child, Node::TableRow { .. }));
        }
        Node::TableRow { children, .. } => {
            children.retain(|child| matches!(child, Node::TableCell { .. }));
        }
        _ => {}
    }
}

/// Group stray inline content at container level into paragraphs and drop
/// formatting whitespace between blocks.
fn normalize_blocks(children: Vec<Node>) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut inline: Vec<Node> = Vec::new();

    for child in children {
        if child.is_inline() {
            inline.push(child);
            continue;
        }
        flush_inline(&mut inline, &mut blocks);
        match child {
            // Transparent wrappers that survived (only the root uses this).
            Node::Unknown { children, .. } => blocks.extend(normalize_blocks(children)),
            block => blocks.push(block),
        }
    }
    flush_inline(&mut inline, &mut blocks);

    blocks
}

fn flush_inline(inline: &mut Vec<Node>, blocks: &mut Vec<Node>) {
    if inline.is_empty() {
        return;
    }
    let run = std::mem::take(inline);
    if run.iter().all(is_blank_text) {
        return;
    }
    blocks.push(Node::paragraph(run));
}

fn normalize_items(children: Vec<Node>) -> Vec<Node> {
    let mut items = Vec::new();
    let mut inline: Vec<Node> = Vec::new();

    for child in children {
        match child {
            Node::ListItem { .. } => {
                flush_item(&mut inline, &mut items);
                items.push(child);
            }
            other if other.is_inline() => inline.push(other),
            other => {
                flush_item(&mut inline, &mut items);
                items.push(Node::list_item(vec![other]));
            }
        }
    }
    flush_item(&mut inline, &mut items);

    items
}

fn flush_item(inline: &mut Vec<Node>, items: &mut Vec<Node>) {
    if inline.is_empty() {
        return;
    }
    let run = std::mem::take(inline);
    if run.iter().all(is_blank_text) {
        return;
    }
    items.push(Node::list_item(run));
}
