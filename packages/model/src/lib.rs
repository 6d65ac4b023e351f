//! # Richdoc Model
//!
//! The rich-text document tree shared by the serializer and the editor.
//!
//! ```text
//! stored JSON ──json──▶ Root ◀──html── HTML fragment
//!                        │
//!                        ▼
//!                compiler-html: Root → HTML
//! ```
//!
//! Both readers are total: malformed input degrades to whatever can be
//! recovered instead of producing an error.

pub mod ast;
pub mod html;
pub mod json;
pub mod tokenizer;

pub use ast::{Align, Document, FormatFlags, HeadingLevel, ListKind, Node, Root, VideoEmbed};
pub use html::parse_html;
pub use tokenizer::{tokenize, Token};
