use criterion::{black_box, criterion_group, criterion_main, Criterion};
use richdoc_compiler_html::{serialize_root, serialize_value};
use richdoc_model::{parse_html, FormatFlags, HeadingLevel, ListKind, Node, Root};
use serde_json::json;

fn article(paragraphs: usize) -> Root {
    let mut children = vec![Node::heading(HeadingLevel::H1, vec![Node::text("Annual report")])];
    for index in 0..paragraphs {
        children.push(Node::paragraph(vec![
            Node::text(format!("Paragraph {index} with ")),
            Node::styled("bold", FormatFlags::BOLD),
            Node::text(", "),
            Node::styled("emphasis & <code>", FormatFlags::ITALIC | FormatFlags::CODE),
            Node::text(" and a "),
            Node::link("https://example.com/", vec![Node::text("link")]),
        ]));
    }
    children.push(Node::list(
        ListKind::Bullet,
        (0..10).map(|i| Node::list_item(vec![Node::text(format!("item {i}"))])).collect(),
    ));
    children.push(Node::table(4, 4));
    Root::new(children)
}

fn serialize_small_document(c: &mut Criterion) {
    let value = json!({
        "root": {
            "type": "root",
            "children": [
                { "type": "paragraph", "children": [{ "type": "text", "text": "Hello", "format": 1 }] }
            ]
        }
    });

    c.bench_function("serialize_small_document", |b| {
        b.iter(|| serialize_value(black_box(&value)))
    });
}

fn serialize_large_document(c: &mut Criterion) {
    let root = article(200);

    c.bench_function("serialize_large_document", |b| {
        b.iter(|| serialize_root(black_box(&root)))
    });
}

fn parse_serialized_document(c: &mut Criterion) {
    let html = serialize_root(&article(200));

    c.bench_function("parse_serialized_document", |b| {
        b.iter(|| parse_html(black_box(&html)))
    });
}

criterion_group!(
    benches,
    serialize_small_document,
    serialize_large_document,
    parse_serialized_document
);
criterion_main!(benches);
