use bitflags::bitflags;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};

bitflags! {
    /// Inline formatting bits carried by a text run.
    ///
    /// Bit values match the stored content format, so a stored `format: 3`
    /// is bold + italic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatFlags: u32 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
    }
}

impl FormatFlags {
    /// Wrapping precedence, outermost first.
    pub const ORDER: [FormatFlags; 5] = [
        FormatFlags::BOLD,
        FormatFlags::ITALIC,
        FormatFlags::UNDERLINE,
        FormatFlags::STRIKETHROUGH,
        FormatFlags::CODE,
    ];

    /// Read a stored bitmask, dropping bits this model does not know.
    pub fn from_stored(bits: u64) -> Self {
        Self::from_bits_truncate(u32::try_from(bits & u64::from(u32::MAX)).unwrap_or(0))
    }

    /// Inline element name for a single flag.
    pub fn tag_name(self) -> Option<&'static str> {
        match self {
            f if f == FormatFlags::BOLD => Some("strong"),
            f if f == FormatFlags::ITALIC => Some("em"),
            f if f == FormatFlags::UNDERLINE => Some("u"),
            f if f == FormatFlags::STRIKETHROUGH => Some("s"),
            f if f == FormatFlags::CODE => Some("code"),
            _ => None,
        }
    }
}

impl Default for FormatFlags {
    fn default() -> Self {
        FormatFlags::empty()
    }
}

impl Serialize for FormatFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

/// Heading rank. Anything outside 1-6 reads as `H2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeadingLevel {
    H1,
    #[default]
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub fn from_number(level: u64) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            4 => Some(HeadingLevel::H4),
            5 => Some(HeadingLevel::H5),
            6 => Some(HeadingLevel::H6),
            _ => None,
        }
    }

    /// Parse a tag name such as `h3`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let digits = tag.strip_prefix('h').or_else(|| tag.strip_prefix('H'))?;
        digits.parse::<u64>().ok().and_then(Self::from_number)
    }

    pub fn number(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
            HeadingLevel::H5 => 5,
            HeadingLevel::H6 => 6,
        }
    }

    pub fn tag_name(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
            HeadingLevel::H5 => "h5",
            HeadingLevel::H6 => "h6",
        }
    }
}

impl Serialize for HeadingLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for HeadingLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = u64::deserialize(deserializer)?;
        Ok(HeadingLevel::from_number(level).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            "justify" => Some(Align::Justify),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ListKind {
    #[default]
    #[serde(rename = "bullet")]
    Bullet,
    #[serde(rename = "number")]
    Ordered,
    #[serde(rename = "check")]
    Task,
}

impl ListKind {
    pub fn ordered(self) -> bool {
        self == ListKind::Ordered
    }
}

/// A video embed resolved from a provider URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEmbed {
    pub provider: String,
    pub video_id: String,
    pub src: String,
}

/// One node of a rich-text tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Text {
        content: String,
        #[serde(rename = "formatFlags")]
        format: FormatFlags,
    },

    Paragraph {
        #[serde(skip_serializing_if = "Option::is_none")]
        align: Option<Align>,
        children: Vec<Node>,
    },

    Heading {
        level: HeadingLevel,
        #[serde(skip_serializing_if = "Option::is_none")]
        align: Option<Align>,
        children: Vec<Node>,
    },

    List {
        #[serde(rename = "listType")]
        kind: ListKind,
        children: Vec<Node>,
    },

    #[serde(rename = "listitem")]
    ListItem {
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        align: Option<Align>,
        children: Vec<Node>,
    },

    Quote {
        #[serde(skip_serializing_if = "Option::is_none")]
        align: Option<Align>,
        children: Vec<Node>,
    },

    Link {
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        children: Vec<Node>,
    },

    #[serde(rename = "linebreak")]
    LineBreak,

    Image {
        src: String,
        alt: String,
    },

    Table {
        children: Vec<Node>,
    },

    #[serde(rename = "tablerow")]
    TableRow {
        header: bool,
        children: Vec<Node>,
    },

    #[serde(rename = "tablecell")]
    TableCell {
        children: Vec<Node>,
    },

    Embed(VideoEmbed),

    /// Anything the model does not recognize. Renders as its children.
    Unknown {
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text {
            content: content.into(),
            format: FormatFlags::empty(),
        }
    }

    pub fn styled(content: impl Into<String>, format: FormatFlags) -> Self {
        Node::Text {
            content: content.into(),
            format,
        }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph {
            align: None,
            children,
        }
    }

    pub fn heading(level: HeadingLevel, children: Vec<Node>) -> Self {
        Node::Heading {
            level,
            align: None,
            children,
        }
    }

    pub fn quote(children: Vec<Node>) -> Self {
        Node::Quote {
            align: None,
            children,
        }
    }

    pub fn list(kind: ListKind, items: Vec<Node>) -> Self {
        Node::List {
            kind,
            children: items,
        }
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Node::ListItem {
            checked: None,
            align: None,
            children,
        }
    }

    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Link {
            url: Some(url.into()),
            target: None,
            children,
        }
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Node::Image {
            src: src.into(),
            alt: alt.into(),
        }
    }

    /// A `rows` × `columns` table whose first row is the header row.
    pub fn table(rows: usize, columns: usize) -> Self {
        let rows = (0..rows)
            .map(|index| Node::TableRow {
                header: index == 0,
                children: (0..columns).map(|_| Node::table_cell()).collect(),
            })
            .collect();
        Node::Table { children: rows }
    }

    pub fn table_cell() -> Self {
        Node::TableCell {
            children: vec![Node::paragraph(vec![])],
        }
    }

    pub fn children(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Paragraph { children, .. }
            | Node::Heading { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Quote { children, .. }
            | Node::Link { children, .. }
            | Node::Table { children }
            | Node::TableRow { children, .. }
            | Node::TableCell { children }
            | Node::Unknown { children, .. } => Some(children),
            Node::Text { .. } | Node::LineBreak | Node::Image { .. } | Node::Embed(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Paragraph { children, .. }
            | Node::Heading { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Quote { children, .. }
            | Node::Link { children, .. }
            | Node::Table { children }
            | Node::TableRow { children, .. }
            | Node::TableCell { children }
            | Node::Unknown { children, .. } => Some(children),
            Node::Text { .. } | Node::LineBreak | Node::Image { .. } | Node::Embed(_) => None,
        }
    }

    /// Nodes that live inside a text block rather than beside blocks.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Node::Text { .. } | Node::Link { .. } | Node::LineBreak | Node::Image { .. }
        )
    }

    /// Blocks whose children are inline content and which carry a caret.
    pub fn is_text_block(&self) -> bool {
        matches!(
            self,
            Node::Paragraph { .. } | Node::Heading { .. } | Node::Quote { .. } | Node::ListItem { .. }
        )
    }

    pub fn align(&self) -> Option<Align> {
        match self {
            Node::Paragraph { align, .. }
            | Node::Heading { align, .. }
            | Node::Quote { align, .. }
            | Node::ListItem { align, .. } => *align,
            _ => None,
        }
    }

    /// Set alignment on a text block; other nodes are left alone.
    pub fn set_align(&mut self, value: Option<Align>) {
        if let Node::Paragraph { align, .. }
        | Node::Heading { align, .. }
        | Node::Quote { align, .. }
        | Node::ListItem { align, .. } = self
        {
            *align = value;
        }
    }

    /// Concatenated text content, with line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        match self {
            Node::Text { content, .. } => content.clone(),
            Node::LineBreak => "\n".to_string(),
            Node::Image { .. } | Node::Embed(_) => String::new(),
            _ => self
                .children()
                .map(|children| children.iter().map(Node::plain_text).collect())
                .unwrap_or_default(),
        }
    }
}

/// Root of a rich-text tree: an ordered list of block nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub children: Vec<Node>,
}

impl Root {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// A document holding a single empty paragraph.
    pub fn empty() -> Self {
        Self {
            children: vec![Node::paragraph(vec![])],
        }
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(Node::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Root {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for Root {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "root")?;
        map.serialize_entry("children", &self.children)?;
        map.end()
    }
}

/// A stored rich-text value: a tree, or HTML kept from older content.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Ast(Root),
    Html(String),
}

impl Document {
    pub fn as_root(&self) -> Option<&Root> {
        match self {
            Document::Ast(root) => Some(root),
            Document::Html(_) => None,
        }
    }
}

impl From<Root> for Document {
    fn from(root: Root) -> Self {
        Document::Ast(root)
    }
}

impl From<String> for Document {
    fn from(html: String) -> Self {
        Document::Html(html)
    }
}

impl From<&str> for Document {
    fn from(html: &str) -> Self {
        Document::Html(html.to_string())
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Ast(root) => root.serialize(serializer),
            Document::Html(html) => serializer.serialize_str(html),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flags_truncate_unknown_bits() {
        let flags = FormatFlags::from_stored(0b1_0000_0011 | 1 << 40);
        assert_eq!(flags, FormatFlags::BOLD | FormatFlags::ITALIC);
    }

    #[test]
    fn test_heading_level_from_tag() {
        assert_eq!(HeadingLevel::from_tag("h4"), Some(HeadingLevel::H4));
        assert_eq!(HeadingLevel::from_tag("h9"), None);
        assert_eq!(HeadingLevel::from_tag("div"), None);
    }

    #[test]
    fn test_table_constructor_flags_header_row() {
        let table = Node::table(2, 3);
        let rows = table.children().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(rows[0], Node::TableRow { header: true, .. }));
        assert!(matches!(rows[1], Node::TableRow { header: false, .. }));
        assert_eq!(rows[1].children().unwrap().len(), 3);
    }

    #[test]
    fn test_node_serializes_with_type_tag() {
        let node = Node::styled("hi", FormatFlags::BOLD);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["formatFlags"], 1);
    }

    #[test]
    fn test_root_plain_text() {
        let root = Root::new(vec![
            Node::paragraph(vec![Node::text("a"), Node::LineBreak, Node::text("b")]),
            Node::heading(HeadingLevel::H1, vec![Node::text("c")]),
        ]);
        assert_eq!(root.plain_text(), "a\nb\nc");
    }
}
