//! # Block Grammar
//!
//! The comment-delimited block markup used for pattern content and for the
//! final output:
//!
//! ```text
//! <!-- wp:group {"className":"x"} -->
//! <!-- wp:paragraph {"content":"Hi"} /-->
//! <!-- /wp:group -->
//! ```
//!
//! - **`cursor`**: byte [`cursor::Cursor`] with position tracking
//! - **`parser`**: [`parse_blocks()`], strict about delimiter balance
//! - **`serializer`**: [`serialize_blocks()`] with comment-safe attribute JSON
//!
//! Names without a namespace belong to `core/`. The parser adds it, the
//! serializer drops it.

pub mod cursor;
pub mod parser;
pub mod serializer;

pub use parser::parse_blocks;
pub use serializer::{serialize_attributes, serialize_block, serialize_blocks};

pub(crate) const CORE_NAMESPACE: &str = "core/";

/// Malformed block markup. Offsets are byte positions of the offending
/// delimiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("block \"{name}\" opened at byte {offset} is never closed")]
    UnclosedBlock { name: String, offset: usize },
    #[error("closing delimiter for \"{name}\" at byte {offset} has no open block")]
    UnexpectedCloser { name: String, offset: usize },
    #[error("expected closing delimiter for \"{expected}\" but found \"{found}\" at byte {offset}")]
    MismatchedCloser {
        expected: String,
        found: String,
        offset: usize,
    },
    #[error("invalid attributes for \"{name}\" at byte {offset}: {message}")]
    InvalidAttributes {
        name: String,
        offset: usize,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serialized_trees_parse_back() {
        let tree = vec![
            Node::new("core/group")
                .with_attribute("className", json!("ai-composer-section"))
                .with_children(vec![
                    Node::new("core/heading")
                        .with_attribute("level", json!(2))
                        .with_attribute("content", json!("Ends with -- and <tags>")),
                    Node::new("acme/card").with_children(vec![Node::new("core/paragraph")]),
                ]),
            Node::new("core/separator").with_attribute("opacity", json!(0.5)),
        ];

        assert_eq!(parse_blocks(&serialize_blocks(&tree)).unwrap(), tree);
    }

    #[test]
    fn error_messages_name_the_block() {
        let err = parse_blocks("<!-- wp:group -->").unwrap_err();
        assert_eq!(
            err.to_string(),
            "block \"core/group\" opened at byte 0 is never closed"
        );
    }
}
