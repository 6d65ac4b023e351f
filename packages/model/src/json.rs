//! Lenient reader for stored JSON documents.
//!
//! Stored content comes from an authoring surface that evolves on its own
//! schedule, so reading never fails: missing fields take defaults, wrongly
//! typed `children` read as empty, and unrecognized node types become
//! [`Node::Unknown`] so their children still render.

use crate::ast::{Align, Document, FormatFlags, HeadingLevel, ListKind, Node, Root, VideoEmbed};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

impl Document {
    /// Read a stored value. `null`, `false` and `""` are the empty document.
    pub fn from_value(value: &Value) -> Option<Document> {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) => None,
            Value::String(html) if html.is_empty() => None,
            Value::String(html) => Some(Document::Html(html.clone())),
            Value::Array(items) => Some(Document::Ast(Root::new(read_nodes(items)))),
            Value::Object(map) => {
                let root = match map.get("root") {
                    Some(inner @ Value::Object(_)) => inner,
                    _ => value,
                };
                Some(Document::Ast(Root::from_value(root)))
            }
        }
    }

    /// Parse stored JSON text. Text that is not JSON at all is kept as HTML.
    pub fn from_json_str(source: &str) -> Option<Document> {
        match serde_json::from_str::<Value>(source) {
            Ok(value) => Document::from_value(&value),
            Err(_) if source.trim().is_empty() => None,
            Err(_) => Some(Document::Html(source.to_string())),
        }
    }
}

impl Root {
    pub fn from_value(value: &Value) -> Root {
        match value {
            Value::Object(map) => Root::new(read_children(map)),
            Value::Array(items) => Root::new(read_nodes(items)),
            _ => Root::new(vec![]),
        }
    }
}

impl Node {
    /// Read one node. Values that are not objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Node> {
        let map = value.as_object()?;
        let kind = map.get("type").and_then(Value::as_str);
        let normalized = kind.map(normalize_type);

        let node = match normalized.as_deref() {
            Some("text") => Node::Text {
                content: read_string(map, &["content", "text"]).unwrap_or_default(),
                format: read_format(map),
            },
            Some("paragraph") => Node::Paragraph {
                align: read_align(map),
                children: read_children(map),
            },
            Some("heading") => Node::Heading {
                level: read_heading_level(map),
                align: read_align(map),
                children: read_children(map),
            },
            Some("list") => Node::List {
                kind: read_list_kind(map),
                children: read_children(map),
            },
            Some("listitem") => Node::ListItem {
                checked: map.get("checked").and_then(Value::as_bool),
                align: read_align(map),
                children: read_children(map),
            },
            Some("quote" | "blockquote") => Node::Quote {
                align: read_align(map),
                children: read_children(map),
            },
            Some("link" | "autolink") => Node::Link {
                url: read_link_url(map),
                target: read_link_target(map),
                children: read_children(map),
            },
            Some("linebreak") => Node::LineBreak,
            Some("image") => Node::Image {
                src: read_string(map, &["src", "url"]).unwrap_or_default(),
                alt: read_string(map, &["alt", "altText"]).unwrap_or_default(),
            },
            Some("table") => Node::Table {
                children: read_children(map),
            },
            Some("tablerow") => Node::TableRow {
                header: map.get("header").and_then(Value::as_bool).unwrap_or(false),
                children: read_children(map),
            },
            Some("tablecell") => Node::TableCell {
                children: read_children(map),
            },
            Some("embed" | "video") => Node::Embed(VideoEmbed {
                provider: read_string(map, &["provider"]).unwrap_or_default(),
                video_id: read_string(map, &["videoId", "video_id", "id"]).unwrap_or_default(),
                src: read_string(map, &["src", "url"]).unwrap_or_default(),
            }),
            _ => Node::Unknown {
                kind: kind.map(str::to_string),
                children: read_children(map),
            },
        };

        Some(node)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Node::from_value(&value).unwrap_or(Node::Unknown {
            kind: None,
            children: vec![],
        }))
    }
}

impl<'de> Deserialize<'de> for Root {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Root::from_value(&value))
    }
}

fn normalize_type(kind: &str) -> String {
    kind.chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn read_nodes(items: &[Value]) -> Vec<Node> {
    items.iter().filter_map(Node::from_value).collect()
}

fn read_children(map: &Map<String, Value>) -> Vec<Node> {
    map.get("children")
        .and_then(Value::as_array)
        .map(|items| read_nodes(items))
        .unwrap_or_default()
}

fn read_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn read_format(map: &Map<String, Value>) -> FormatFlags {
    ["formatFlags", "format"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_u64))
        .map(FormatFlags::from_stored)
        .unwrap_or_default()
}

// Element nodes store alignment either as `align` or as a string `format`.
fn read_align(map: &Map<String, Value>) -> Option<Align> {
    ["align", "format"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .and_then(Align::parse)
}

fn read_heading_level(map: &Map<String, Value>) -> HeadingLevel {
    if let Some(level) = map.get("level") {
        return level
            .as_u64()
            .and_then(HeadingLevel::from_number)
            .unwrap_or_default();
    }

    map.get("tag")
        .and_then(Value::as_str)
        .and_then(HeadingLevel::from_tag)
        .unwrap_or_default()
}

fn read_list_kind(map: &Map<String, Value>) -> ListKind {
    if let Some(list_type) = map.get("listType").and_then(Value::as_str) {
        return match list_type {
            "number" | "ordered" => ListKind::Ordered,
            "check" | "task" => ListKind::Task,
            _ => ListKind::Bullet,
        };
    }

    if let Some(ordered) = map.get("ordered").and_then(Value::as_bool) {
        return if ordered { ListKind::Ordered } else { ListKind::Bullet };
    }

    match map.get("tag").and_then(Value::as_str) {
        Some("ol") => ListKind::Ordered,
        _ => ListKind::Bullet,
    }
}

fn read_link_url(map: &Map<String, Value>) -> Option<String> {
    read_string(map, &["url", "href"]).or_else(|| {
        map.get("fields")
            .and_then(Value::as_object)
            .and_then(|fields| read_string(fields, &["url"]))
    })
}

fn read_link_target(map: &Map<String, Value>) -> Option<String> {
    if let Some(target) = read_string(map, &["target"]) {
        return Some(target);
    }

    let new_tab = map.get("newTab").and_then(Value::as_bool).or_else(|| {
        map.get("fields")
            .and_then(Value::as_object)
            .and_then(|fields| fields.get("newTab"))
            .and_then(Value::as_bool)
    });

    match new_tab {
        Some(true) => Some("_blank".to_string()),
        Some(false) => Some("_self".to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_values_are_empty() {
        assert_eq!(Document::from_value(&Value::Null), None);
        assert_eq!(Document::from_value(&json!("")), None);
        assert_eq!(Document::from_value(&json!(false)), None);
    }

    #[test]
    fn test_string_reads_as_html() {
        let doc = Document::from_value(&json!("<p>x</p>")).unwrap();
        assert_eq!(doc, Document::Html("<p>x</p>".to_string()));
    }

    #[test]
    fn test_wrapped_root_is_unwrapped() {
        let value = json!({
            "root": {
                "type": "root",
                "children": [{ "type": "paragraph", "children": [{ "type": "text", "text": "hi", "format": 1 }] }]
            }
        });

        let doc = Document::from_value(&value).unwrap();
        let root = doc.as_root().unwrap();
        assert_eq!(
            root.children,
            vec![Node::paragraph(vec![Node::styled("hi", FormatFlags::BOLD)])]
        );
    }

    #[test]
    fn test_malformed_children_read_as_empty() {
        let node = Node::from_value(&json!({ "type": "paragraph", "children": "nope" })).unwrap();
        assert_eq!(node, Node::paragraph(vec![]));

        let node = Node::from_value(&json!({ "type": "quote", "children": [1, null, { "type": "text", "content": "q" }] })).unwrap();
        assert_eq!(node.plain_text(), "q");
    }

    #[test]
    fn test_missing_type_is_unknown() {
        let node = Node::from_value(&json!({ "children": [{ "type": "text", "content": "x" }] })).unwrap();
        assert!(matches!(node, Node::Unknown { kind: None, .. }));
    }

    #[test]
    fn test_heading_level_sources() {
        let from_tag = Node::from_value(&json!({ "type": "heading", "tag": "h3" })).unwrap();
        assert!(matches!(from_tag, Node::Heading { level: HeadingLevel::H3, .. }));

        let out_of_range = Node::from_value(&json!({ "type": "heading", "level": 9 })).unwrap();
        assert!(matches!(out_of_range, Node::Heading { level: HeadingLevel::H2, .. }));

        let missing = Node::from_value(&json!({ "type": "heading" })).unwrap();
        assert!(matches!(missing, Node::Heading { level: HeadingLevel::H2, .. }));
    }

    #[test]
    fn test_list_kind_sources() {
        let numbered = Node::from_value(&json!({ "type": "list", "listType": "number" })).unwrap();
        assert!(matches!(numbered, Node::List { kind: ListKind::Ordered, .. }));

        let ordered = Node::from_value(&json!({ "type": "list", "ordered": true })).unwrap();
        assert!(matches!(ordered, Node::List { kind: ListKind::Ordered, .. }));

        let tagged = Node::from_value(&json!({ "type": "list", "tag": "ul" })).unwrap();
        assert!(matches!(tagged, Node::List { kind: ListKind::Bullet, .. }));
    }

    #[test]
    fn test_link_fields() {
        let node = Node::from_value(&json!({
            "type": "link",
            "fields": { "url": "https://example.com", "newTab": false },
            "children": []
        }))
        .unwrap();

        assert_eq!(
            node,
            Node::Link {
                url: Some("https://example.com".to_string()),
                target: Some("_self".to_string()),
                children: vec![],
            }
        );
    }

    #[test]
    fn test_negative_format_is_plain() {
        let node = Node::from_value(&json!({ "type": "text", "content": "x", "formatFlags": -3 })).unwrap();
        assert_eq!(node, Node::text("x"));
    }

    #[test]
    fn test_serialized_tree_reads_back() {
        let root = Root::new(vec![
            Node::heading(HeadingLevel::H3, vec![Node::text("Title")]),
            Node::list(ListKind::Task, vec![Node::ListItem {
                checked: Some(true),
                align: Some(Align::Center),
                children: vec![Node::link("/about", vec![Node::styled("about", FormatFlags::ITALIC)])],
            }]),
            Node::table(2, 2),
        ]);

        let json = serde_json::to_string(&root).unwrap();
        let back: Root = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }
}
