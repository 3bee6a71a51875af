use serde_json::{Map, Value};

use super::{CORE_NAMESPACE, GrammarError, cursor::Cursor};
use crate::node::Node;

const COMMENT_OPEN: &[u8] = b"<!--";
const COMMENT_CLOSE: &str = "-->";
const BLOCK_PREFIX: &[u8] = b"wp:";

/// One recognized block comment.
#[derive(Debug, PartialEq)]
enum Delimiter {
    Open {
        name: String,
        attributes: Map<String, Value>,
    },
    Void {
        name: String,
        attributes: Map<String, Value>,
    },
    Close {
        name: String,
    },
}

/// Parses block markup into nodes.
///
/// Only block comments produce nodes; the HTML between them is freeform and
/// skipped, as are comments that are not block delimiters. Unbalanced
/// delimiters and attribute payloads that are not JSON objects are errors.
pub fn parse_blocks(markup: &str) -> Result<Vec<Node>, GrammarError> {
    let mut cur = Cursor::new(markup);
    let mut out = Vec::new();
    // Open blocks with the offset of their opening delimiter.
    let mut stack: Vec<(Node, usize)> = Vec::new();

    while cur.seek("<!--") {
        let offset = cur.pos();
        let Some(delimiter) = try_parse_delimiter(&mut cur)? else {
            cur.bump_n(COMMENT_OPEN.len());
            continue;
        };

        match delimiter {
            Delimiter::Open { name, attributes } => {
                stack.push((Node::new(name).with_attributes(attributes), offset));
            }
            Delimiter::Void { name, attributes } => {
                attach(&mut stack, &mut out, Node::new(name).with_attributes(attributes));
            }
            Delimiter::Close { name } => {
                let Some((node, _)) = stack.pop() else {
                    return Err(GrammarError::UnexpectedCloser { name, offset });
                };
                if node.name != name {
                    return Err(GrammarError::MismatchedCloser {
                        expected: node.name,
                        found: name,
                        offset,
                    });
                }
                attach(&mut stack, &mut out, node);
            }
        }
    }

    if let Some((node, offset)) = stack.pop() {
        return Err(GrammarError::UnclosedBlock {
            name: node.name,
            offset,
        });
    }

    Ok(out)
}

fn attach(stack: &mut [(Node, usize)], out: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some((parent, _)) => parent.children.push(node),
        None => out.push(node),
    }
}

/// Attempts to parse a block delimiter at the current position.
///
/// Returns `Ok(None)` for comments that are not block delimiters; the cursor
/// is then restored. On success the cursor sits after the closing `-->`.
fn try_parse_delimiter(cur: &mut Cursor<'_>) -> Result<Option<Delimiter>, GrammarError> {
    let saved = cur.clone();
    let offset = cur.pos();

    match scan_delimiter(cur, offset)? {
        Some(delimiter) => Ok(Some(delimiter)),
        None => {
            *cur = saved;
            Ok(None)
        }
    }
}

fn scan_delimiter(cur: &mut Cursor<'_>, offset: usize) -> Result<Option<Delimiter>, GrammarError> {
    if !cur.starts_with(COMMENT_OPEN) {
        return Ok(None);
    }
    cur.bump_n(COMMENT_OPEN.len());
    if cur.skip_whitespace() == 0 {
        return Ok(None);
    }

    let closer = cur.peek() == Some(b'/');
    if closer {
        cur.bump();
    }
    if !cur.starts_with(BLOCK_PREFIX) {
        return Ok(None);
    }
    cur.bump_n(BLOCK_PREFIX.len());

    let Some(name) = scan_name(cur) else {
        return Ok(None);
    };

    // Everything up to `-->` is the optional attribute payload and void marker.
    let body_start = cur.pos();
    if !cur.seek(COMMENT_CLOSE) {
        return Ok(None);
    }
    let body = &cur.s[body_start..cur.pos()];
    cur.bump_n(COMMENT_CLOSE.len());

    if !body.is_empty() && !body.starts_with(|c: char| c.is_ascii_whitespace() || c == '/') {
        return Ok(None);
    }
    let body = body.trim();
    let (body, void) = match body.strip_suffix('/') {
        Some(rest) => (rest.trim_end(), true),
        None => (body, false),
    };

    if closer {
        return Ok((body.is_empty() && !void).then_some(Delimiter::Close { name }));
    }

    let attributes = if body.is_empty() {
        Map::new()
    } else if body.starts_with('{') {
        parse_attributes(body, &name, offset)?
    } else {
        return Ok(None);
    };

    Ok(Some(if void {
        Delimiter::Void { name, attributes }
    } else {
        Delimiter::Open { name, attributes }
    }))
}

/// Scans `name` or `namespace/name`, qualifying bare names with `core/`.
fn scan_name(cur: &mut Cursor<'_>) -> Option<String> {
    let first = scan_name_part(cur)?;
    if cur.peek() != Some(b'/') {
        return Some(format!("{CORE_NAMESPACE}{first}"));
    }

    let saved = cur.clone();
    cur.bump();
    match scan_name_part(cur) {
        Some(second) => Some(format!("{first}/{second}")),
        None => {
            // `name/-->`: the slash belongs to the void marker.
            *cur = saved;
            Some(format!("{CORE_NAMESPACE}{first}"))
        }
    }
}

fn scan_name_part<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
    if !cur.peek().is_some_and(|b| b.is_ascii_lowercase()) {
        return None;
    }
    Some(cur.take_while(|b| {
        b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-'
    }))
}

fn parse_attributes(body: &str, name: &str, offset: usize) -> Result<Map<String, Value>, GrammarError> {
    let invalid = |message: String| GrammarError::InvalidAttributes {
        name: name.to_string(),
        offset,
        message,
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(attributes)) => Ok(attributes),
        Ok(other) => Err(invalid(format!("expected an object, found {other}"))),
        Err(e) => Err(invalid(e.to_string())),
    }
}
