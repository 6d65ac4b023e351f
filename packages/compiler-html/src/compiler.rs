use richdoc_model::{Align, Document, FormatFlags, ListKind, Node, Root, VideoEmbed};
use serde_json::Value;
use tracing::instrument;

/// `rel` attached to every link.
pub const LINK_REL: &str = "noopener noreferrer";

/// 16:9 wrapper around embedded players.
const EMBED_WRAPPER_STYLE: &str =
    "position: relative; padding-bottom: 56.25%; height: 0; overflow: hidden";
const EMBED_FRAME_STYLE: &str =
    "position: absolute; top: 0; left: 0; width: 100%; height: 100%; border: 0";
const NO_ATTRIBUTES: &[(&str, &str)] = &[];
const TASK_LIST_ATTRIBUTES: &[(&str, &str)] = &[("data-type", "taskList")];

const EMBED_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Options for HTML serialization
#[derive(Debug, Clone, PartialEq)]
pub struct SerializeOptions {
    /// `target` for links that do not carry their own
    pub link_target: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            link_target: "_blank".to_string(),
        }
    }
}

struct Context<'a> {
    options: &'a SerializeOptions,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a SerializeOptions) -> Self {
        Self {
            options,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_escaped(&mut self, text: &str) {
        escape_into(text, &mut self.buffer);
    }

    fn open(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        self.add("<");
        self.add(tag);
        for (name, value) in attributes {
            self.add(" ");
            self.add(name);
            self.add("=\"");
            self.add_escaped(value);
            self.add("\"");
        }
        if is_self_closing(tag) {
            self.add(" />");
        } else {
            self.add(">");
        }
    }

    fn close(&mut self, tag: &str) {
        self.add("</");
        self.add(tag);
        self.add(">");
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Serialize a stored document to HTML with default options.
///
/// `None` and empty strings give `""`; a string document is returned as is.
pub fn serialize(document: Option<&Document>) -> String {
    serialize_with(document, &SerializeOptions::default())
}

#[instrument(skip_all)]
pub fn serialize_with(document: Option<&Document>, options: &SerializeOptions) -> String {
    match document {
        None => String::new(),
        Some(Document::Html(html)) => html.clone(),
        Some(Document::Ast(root)) => serialize_root_with(root, options),
    }
}

/// Serialize a raw stored JSON value, reading it leniently first.
pub fn serialize_value(value: &Value) -> String {
    serialize(Document::from_value(value).as_ref())
}

pub fn serialize_root(root: &Root) -> String {
    serialize_root_with(root, &SerializeOptions::default())
}

pub fn serialize_root_with(root: &Root, options: &SerializeOptions) -> String {
    serialize_nodes_with(&root.children, options)
}

pub fn serialize_nodes(nodes: &[Node]) -> String {
    serialize_nodes_with(nodes, &SerializeOptions::default())
}

pub fn serialize_nodes_with(nodes: &[Node], options: &SerializeOptions) -> String {
    let mut ctx = Context::new(options);
    for node in nodes {
        compile_node(node, &mut ctx);
    }
    ctx.get_output()
}

fn compile_children(children: &[Node], ctx: &mut Context) {
    for child in children {
        compile_node(child, ctx);
    }
}

fn compile_node(node: &Node, ctx: &mut Context) {
    match node {
        Node::Text { content, format } => compile_text(content, *format, ctx),

        Node::Paragraph { align, children } => compile_block("p", *align, &[], children, ctx),

        Node::Heading {
            level,
            align,
            children,
        } => compile_block(level.tag_name(), *align, &[], children, ctx),

        Node::List { kind, children } => {
            let (tag, attributes) = match kind {
                ListKind::Ordered => ("ol", NO_ATTRIBUTES),
                ListKind::Bullet => ("ul", NO_ATTRIBUTES),
                ListKind::Task => ("ul", TASK_LIST_ATTRIBUTES),
            };
            ctx.open(tag, attributes);
            compile_children(children, ctx);
            ctx.close(tag);
        }

        Node::ListItem {
            checked,
            align,
            children,
        } => match checked {
            Some(checked) => {
                let value = if *checked { "true" } else { "false" };
                compile_block("li", *align, &[("data-checked", value)], children, ctx);
            }
            None => compile_block("li", *align, &[], children, ctx),
        },

        Node::Quote { align, children } => compile_block("blockquote", *align, &[], children, ctx),

        Node::Link {
            url,
            target,
            children,
        } => {
            let href = url.as_deref().filter(|url| !url.is_empty()).unwrap_or("#");
            let target = target
                .as_deref()
                .unwrap_or(ctx.options.link_target.as_str())
                .to_string();
            ctx.open("a", &[("href", href), ("rel", LINK_REL), ("target", target.as_str())]);
            compile_children(children, ctx);
            ctx.close("a");
        }

        Node::LineBreak => ctx.open("br", &[]),

        Node::Image { src, alt } => ctx.open("img", &[("src", src.as_str()), ("alt", alt.as_str())]),

        Node::Table { children } => {
            ctx.open("table", &[]);
            compile_children(children, ctx);
            ctx.close("table");
        }

        Node::TableRow { header, children } => {
            let cell_tag = if *header { "th" } else { "td" };
            ctx.open("tr", &[]);
            for cell in children {
                match cell {
                    Node::TableCell { children } => {
                        ctx.open(cell_tag, &[]);
                        compile_children(children, ctx);
                        ctx.close(cell_tag);
                    }
                    other => compile_node(other, ctx),
                }
            }
            ctx.close("tr");
        }

        // Cells outside a row have no header context.
        Node::TableCell { children } => {
            ctx.open("td", &[]);
            compile_children(children, ctx);
            ctx.close("td");
        }

        Node::Embed(embed) => compile_embed(embed, ctx),

        Node::Unknown { children, .. } => compile_children(children, ctx),
    }
}

fn compile_block(
    tag: &str,
    align: Option<Align>,
    extra: &[(&str, &str)],
    children: &[Node],
    ctx: &mut Context,
) {
    let style = align.map(|align| format!("text-align: {}", align.as_str()));
    let mut attributes: Vec<(&str, &str)> = extra.to_vec();
    if let Some(style) = &style {
        attributes.push(("style", style.as_str()));
    }

    ctx.open(tag, &attributes);
    compile_children(children, ctx);
    ctx.close(tag);
}

fn compile_text(content: &str, format: FormatFlags, ctx: &mut Context) {
    let active: Vec<&str> = FormatFlags::ORDER
        .iter()
        .filter(|flag| format.contains(**flag))
        .filter_map(|flag| flag.tag_name())
        .collect();

    for tag in &active {
        ctx.open(tag, &[]);
    }
    ctx.add_escaped(content);
    for tag in active.iter().rev() {
        ctx.close(tag);
    }
}

fn compile_embed(embed: &VideoEmbed, ctx: &mut Context) {
    ctx.open(
        "div",
        &[
            ("data-video-embed", embed.provider.as_str()),
            ("data-video-id", embed.video_id.as_str()),
            ("style", EMBED_WRAPPER_STYLE),
        ],
    );
    ctx.open(
        "iframe",
        &[
            ("src", embed.src.as_str()),
            ("style", EMBED_FRAME_STYLE),
            ("frameborder", "0"),
            ("allow", EMBED_ALLOW),
            ("allowfullscreen", "true"),
        ],
    );
    ctx.close("iframe");
    ctx.close("div");
}

/// Escape text for use in element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

fn is_self_closing(tag: &str) -> bool {
    matches!(tag, "img" | "br" | "hr")
}
