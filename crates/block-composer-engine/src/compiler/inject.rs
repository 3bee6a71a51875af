use crate::node::Node;

/// Places `content` inside expanded pattern nodes.
///
/// The first strategy that finds a target wins:
///
/// 1. **Explicit slot**: the first node, depth-first, whose class list
///    contains `slot_class`.
/// 2. **Deepest container**: scanning from the last node backward, a node's
///    children are searched before the node itself is considered, and a node
///    qualifies when `is_container` accepts its name.
/// 3. **Siblings**: `content` is appended after the pattern nodes.
///
/// Content is always appended after existing children, and no node is ever
/// dropped.
pub fn inject(
    pattern_nodes: Vec<Node>,
    content: Vec<Node>,
    slot_class: &str,
    is_container: impl Fn(&str) -> bool,
) -> Vec<Node> {
    if content.is_empty() {
        return pattern_nodes;
    }

    let mut nodes = pattern_nodes;
    let target = match find_slot(&nodes, slot_class) {
        Some(path) => {
            log::debug!("Injecting {} node(s) into slot at {path:?}", content.len());
            Some(path)
        }
        None => find_container(&nodes, &is_container).inspect(|path| {
            log::debug!("Injecting {} node(s) into container at {path:?}", content.len());
        }),
    };

    if let Some(path) = target
        && let Some(node) = node_at_mut(&mut nodes, &path)
    {
        node.children.extend(content);
        return nodes;
    }

    log::debug!("No slot or container found, appending content as siblings");
    nodes.extend(content);
    nodes
}

/// Index path of the first node carrying the slot class.
fn find_slot(nodes: &[Node], slot_class: &str) -> Option<Vec<usize>> {
    for (i, node) in nodes.iter().enumerate() {
        if node.has_class(slot_class) {
            return Some(vec![i]);
        }
        if let Some(mut path) = find_slot(&node.children, slot_class) {
            path.insert(0, i);
            return Some(path);
        }
    }
    None
}

/// Index path of the deepest usable container, preferring later siblings.
fn find_container(nodes: &[Node], is_container: &impl Fn(&str) -> bool) -> Option<Vec<usize>> {
    for (i, node) in nodes.iter().enumerate().rev() {
        if let Some(mut path) = find_container(&node.children, is_container) {
            path.insert(0, i);
            return Some(path);
        }
        if is_container(&node.name) {
            return Some(vec![i]);
        }
    }
    None
}

fn node_at_mut<'n>(nodes: &'n mut [Node], path: &[usize]) -> Option<&'n mut Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get_mut(*first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at_mut(&mut node.children, rest)
    }
}
