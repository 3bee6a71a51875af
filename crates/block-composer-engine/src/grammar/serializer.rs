use serde_json::{Map, Value};

use super::CORE_NAMESPACE;
use crate::node::Node;

/// Serializes nodes into block markup, top-level blocks separated by a
/// blank line.
pub fn serialize_blocks(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(serialize_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Serializes a single node and its descendants.
///
/// Childless nodes use the void form `<!-- wp:name /-->`; otherwise each
/// child goes on its own line between the opening and closing delimiters.
pub fn serialize_block(node: &Node) -> String {
    let mut out = String::new();
    write_block(node, &mut out);
    out
}

fn write_block(node: &Node, out: &mut String) {
    let name = node
        .name
        .strip_prefix(CORE_NAMESPACE)
        .unwrap_or(&node.name);

    out.push_str("<!-- wp:");
    out.push_str(name);
    if !node.attributes.is_empty() {
        out.push(' ');
        out.push_str(&serialize_attributes(&node.attributes));
    }

    if node.children.is_empty() {
        out.push_str(" /-->");
        return;
    }

    out.push_str(" -->\n");
    for child in &node.children {
        write_block(child, out);
        out.push('\n');
    }
    out.push_str("<!-- /wp:");
    out.push_str(name);
    out.push_str(" -->");
}

/// Encodes attributes as JSON that can sit inside an HTML comment.
///
/// Inside string literals `--`, `<`, `>`, `&` and escaped quotes are replaced
/// by unicode escapes, so attribute data can never end the comment or be
/// mistaken for markup. The JSON value is unchanged.
pub fn serialize_attributes(attributes: &Map<String, Value>) -> String {
    let json = Value::Object(attributes.clone()).to_string();
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if !in_string {
            in_string = c == '"';
            out.push(c);
            continue;
        }

        match c {
            '\\' => match chars.next() {
                Some('"') => out.push_str("\\u0022"),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            '"' => {
                in_string = false;
                out.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                out.push_str("\\u002d\\u002d");
            }
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }

    out
}
