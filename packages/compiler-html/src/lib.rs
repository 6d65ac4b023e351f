//! # Richdoc HTML compiler
//!
//! Pure, stateless conversion of a rich-text document into an HTML string.
//! Malformed or unrecognized structure never fails the render: unknown
//! wrappers are dropped and their children rendered in place.

mod compiler;

#[cfg(test)]
mod tests;

pub use compiler::{
    escape_html, serialize, serialize_nodes, serialize_nodes_with, serialize_root,
    serialize_root_with, serialize_value, serialize_with, SerializeOptions, LINK_REL,
};
