use crate::{serialize, serialize_root, serialize_value, serialize_with, SerializeOptions};
use richdoc_model::{
    parse_html, Align, Document, FormatFlags, HeadingLevel, ListKind, Node, Root, VideoEmbed,
};
use serde_json::json;

fn doc(children: Vec<Node>) -> Document {
    Document::Ast(Root::new(children))
}

#[test]
fn test_empty_documents_render_nothing() {
    assert_eq!(serialize(None), "");
    assert_eq!(serialize_value(&json!(null)), "");
    assert_eq!(serialize_value(&json!("")), "");
    assert_eq!(serialize(Some(&Document::Html(String::new()))), "");
}

#[test]
fn test_html_string_passes_through() {
    let html = "<p>already html</p>";
    assert_eq!(serialize(Some(&Document::from(html))), html);
    assert_eq!(serialize_value(&json!(html)), html);
}

#[test]
fn test_bold_wraps_italic() {
    let document = doc(vec![Node::styled("text", FormatFlags::BOLD | FormatFlags::ITALIC)]);
    assert_eq!(serialize(Some(&document)), "<strong><em>text</em></strong>");
}

#[test]
fn test_all_flags_nest_in_fixed_order() {
    let document = doc(vec![Node::styled("x", FormatFlags::all())]);
    assert_eq!(
        serialize(Some(&document)),
        "<strong><em><u><s><code>x</code></s></u></em></strong>"
    );
}

#[test]
fn test_unknown_format_bits_are_ignored() {
    let html = serialize_value(&json!({
        "type": "root",
        "children": [{ "type": "text", "content": "x", "formatFlags": 65 }]
    }));
    assert_eq!(html, "<strong>x</strong>");
}

#[test]
fn test_heading_level_out_of_range_uses_h2() {
    let html = serialize_value(&json!({
        "type": "root",
        "children": [{ "type": "heading", "level": 9, "children": [{ "type": "text", "content": "T" }] }]
    }));
    assert_eq!(html, "<h2>T</h2>");
}

#[test]
fn test_heading_levels_map_to_tags() {
    let html = serialize_root(&Root::new(vec![
        Node::heading(HeadingLevel::H1, vec![Node::text("a")]),
        Node::heading(HeadingLevel::H6, vec![Node::text("b")]),
    ]));
    assert_eq!(html, "<h1>a</h1><h6>b</h6>");
}

#[test]
fn test_unknown_node_renders_children_only() {
    let html = serialize_value(&json!({
        "type": "root",
        "children": [{ "type": "mystery", "children": [{ "type": "text", "content": "x", "formatFlags": 0 }] }]
    }));
    assert_eq!(html, "x");
}

#[test]
fn test_node_without_type_renders_children_only() {
    let html = serialize_value(&json!({
        "children": [{ "children": [{ "type": "text", "content": "y" }] }]
    }));
    assert_eq!(html, "y");
}

#[test]
fn test_link_defaults() {
    let document = doc(vec![Node::link("https://example.com", vec![Node::text("go")])]);
    assert_eq!(
        serialize(Some(&document)),
        "<a href=\"https://example.com\" rel=\"noopener noreferrer\" target=\"_blank\">go</a>"
    );
}

#[test]
fn test_link_without_url_points_to_hash() {
    let document = doc(vec![Node::Link {
        url: None,
        target: Some("_self".to_string()),
        children: vec![Node::text("top")],
    }]);
    assert_eq!(
        serialize(Some(&document)),
        "<a href=\"#\" rel=\"noopener noreferrer\" target=\"_self\">top</a>"
    );
}

#[test]
fn test_link_target_option() {
    let document = doc(vec![Node::link("/news", vec![Node::text("news")])]);
    let options = SerializeOptions {
        link_target: "_self".to_string(),
    };
    assert!(serialize_with(Some(&document), &options).contains("target=\"_self\""));
}

#[test]
fn test_blocks_and_lists() {
    let document = doc(vec![
        Node::paragraph(vec![Node::text("a"), Node::LineBreak, Node::text("b")]),
        Node::list(ListKind::Ordered, vec![Node::list_item(vec![Node::text("one")])]),
        Node::list(ListKind::Bullet, vec![Node::list_item(vec![Node::text("dot")])]),
        Node::quote(vec![Node::text("q")]),
    ]);

    assert_eq!(
        serialize(Some(&document)),
        "<p>a<br />b</p><ol><li>one</li></ol><ul><li>dot</li></ul><blockquote>q</blockquote>"
    );
}

#[test]
fn test_task_list_and_alignment() {
    let document = doc(vec![
        Node::list(ListKind::Task, vec![Node::ListItem {
            checked: Some(false),
            align: None,
            children: vec![Node::text("todo")],
        }]),
        Node::Paragraph {
            align: Some(Align::Center),
            children: vec![Node::text("c")],
        },
    ]);

    assert_eq!(
        serialize(Some(&document)),
        "<ul data-type=\"taskList\"><li data-checked=\"false\">todo</li></ul><p style=\"text-align: center\">c</p>"
    );
}

#[test]
fn test_table_header_cells() {
    let html = serialize(Some(&doc(vec![Node::table(2, 1)])));
    assert_eq!(
        html,
        "<table><tr><th><p></p></th></tr><tr><td><p></p></td></tr></table>"
    );
}

#[test]
fn test_image_and_embed() {
    let document = doc(vec![
        Node::paragraph(vec![Node::image("/media/a.png", "A \"quoted\" alt")]),
        Node::Embed(VideoEmbed {
            provider: "youtube".to_string(),
            video_id: "dQw4w9WgXcQ".to_string(),
            src: "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ".to_string(),
        }),
    ]);

    let html = serialize(Some(&document));
    assert!(html.starts_with("<p><img src=\"/media/a.png\" alt=\"A &quot;quoted&quot; alt\" /></p>"));
    assert!(html.contains("data-video-id=\"dQw4w9WgXcQ\""));
    assert!(html.contains("<iframe src=\"https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ\""));
    assert!(html.contains("padding-bottom: 56.25%"));
    assert!(html.ends_with("</iframe></div>"));
}

#[test]
fn test_text_is_escaped() {
    let document = doc(vec![Node::paragraph(vec![Node::text("Hello <world> & 'friends'")])]);
    assert_eq!(
        serialize(Some(&document)),
        "<p>Hello &lt;world&gt; &amp; &#39;friends&#39;</p>"
    );
}

#[test]
fn test_malformed_input_never_fails() {
    let html = serialize_value(&json!({
        "type": "root",
        "children": [
            { "type": "paragraph", "children": { "not": "a list" } },
            { "type": "list", "children": [null, 3, { "type": "listitem" }] },
            { "type": "link", "children": [{ "type": "text", "text": "legacy", "format": 2 }] },
            "stray string",
        ]
    }));

    assert_eq!(
        html,
        "<p></p><ul><li></li></ul><a href=\"#\" rel=\"noopener noreferrer\" target=\"_blank\"><em>legacy</em></a>"
    );
}

#[test]
fn test_serialization_is_deterministic() {
    let document = doc(vec![Node::paragraph(vec![Node::styled("same", FormatFlags::UNDERLINE)])]);
    assert_eq!(serialize(Some(&document)), serialize(Some(&document)));
}

#[test]
fn test_html_reader_round_trip() {
    let root = Root::new(vec![
        Node::heading(HeadingLevel::H1, vec![Node::text("Welcome")]),
        Node::Paragraph {
            align: Some(Align::Right),
            children: vec![
                Node::text("Join the "),
                Node::link("/join", vec![Node::styled("society", FormatFlags::BOLD)]),
                Node::LineBreak,
                Node::styled("it's <free>", FormatFlags::CODE | FormatFlags::STRIKETHROUGH),
                Node::image("/a.png", "logo"),
            ],
        },
        Node::list(ListKind::Task, vec![
            Node::ListItem {
                checked: Some(true),
                align: None,
                children: vec![Node::text("done")],
            },
            Node::ListItem {
                checked: Some(false),
                align: None,
                children: vec![Node::text("open")],
            },
        ]),
        Node::quote(vec![Node::styled("quote", FormatFlags::ITALIC)]),
        Node::table(2, 2),
        Node::Embed(VideoEmbed {
            provider: "youtube".to_string(),
            video_id: "dQw4w9WgXcQ".to_string(),
            src: "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ".to_string(),
        }),
        Node::paragraph(vec![]),
    ]);

    let html = serialize_root(&root);
    let reparsed = parse_html(&html);

    assert_eq!(serialize_root(&reparsed), html);
}
