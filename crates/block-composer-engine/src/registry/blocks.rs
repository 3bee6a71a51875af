use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{AllowList, BlockRegistry};

/// Block types that exist on a site but make no sense in a composed page.
pub const EXCLUDED_BLOCKS: &[&str] = &[
    "core/missing",
    "core/block",
    "core/freeform",
    "core/html",
    "core/more",
    "core/nextpage",
    "core/shortcode",
    "core/legacy-widget",
    "core/widget-group",
    "core/archives",
    "core/calendar",
    "core/categories",
    "core/latest-comments",
    "core/latest-posts",
    "core/rss",
    "core/search",
    "core/tag-cloud",
    "core/page-list",
    "core/loginout",
    "core/post-template",
    "core/query-pagination",
    "core/query-pagination-next",
    "core/query-pagination-numbers",
    "core/query-pagination-previous",
    "core/query-no-results",
    "core/query-title",
    "core/template-part",
    "core/site-title",
    "core/site-tagline",
    "core/site-logo",
    "core/navigation",
    "core/navigation-link",
    "core/navigation-submenu",
    "core/post-title",
    "core/post-content",
    "core/post-date",
    "core/post-excerpt",
    "core/post-featured-image",
    "core/post-terms",
    "core/post-author",
    "core/post-author-name",
    "core/post-navigation-link",
    "core/post-comments-form",
    "core/comments",
    "core/comment-author-name",
    "core/comment-content",
    "core/comment-date",
    "core/comment-edit-link",
    "core/comment-reply-link",
    "core/comment-template",
    "core/avatar",
    "core/home-link",
    "core/footnotes",
];

/// Parent-constrained blocks that stay composable because the model needs
/// them as children of their parents.
pub const COMPOSABLE_CHILD_BLOCKS: &[&str] = &[
    "core/column",
    "core/list-item",
    "core/button",
    "core/navigation-link",
];

/// Containers that always accept nested content, whatever their flags say.
const IMPLICIT_CONTAINERS: &[&str] = &["core/group", "core/columns", "core/column"];

/// A registered block type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockType {
    pub name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub supports_inner_blocks: bool,
    /// Parent blocks this block may only appear in. Empty means anywhere.
    pub parent: Vec<String>,
    /// Attribute names, in declaration order.
    pub attributes: Vec<String>,
}

impl BlockType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self {
            supports_inner_blocks: true,
            ..Self::new(name)
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}

/// In-memory block registry.
#[derive(Debug, Clone, Default)]
pub struct BlockCatalog {
    blocks: BTreeMap<String, BlockType>,
}

impl BlockCatalog {
    pub fn new(blocks: impl IntoIterator<Item = BlockType>) -> Self {
        let mut catalog = Self::default();
        for block in blocks {
            catalog.register(block);
        }
        catalog
    }

    /// Registers a block type, replacing any previous registration.
    pub fn register(&mut self, block: BlockType) {
        if block.name.is_empty() {
            log::warn!("Skipping block registration without a name");
            return;
        }
        self.blocks.insert(block.name.clone(), block);
    }

    pub fn get(&self, name: &str) -> Option<&BlockType> {
        self.blocks.get(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockRegistry for BlockCatalog {
    fn block_exists(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    fn supports_inner_blocks(&self, name: &str) -> bool {
        self.blocks
            .get(name)
            .is_some_and(|b| b.supports_inner_blocks || IMPLICIT_CONTAINERS.contains(&b.name.as_str()))
    }

    fn block_types(&self) -> Vec<&BlockType> {
        self.blocks.values().collect()
    }
}

/// Blocks the model may be offered: registered, not internal, not
/// parent-constrained (unless a known composable child) and allowed.
pub fn composable_blocks<'a>(registry: &'a dyn BlockRegistry, allow: &AllowList) -> Vec<&'a BlockType> {
    registry
        .block_types()
        .into_iter()
        .filter(|block| !EXCLUDED_BLOCKS.contains(&block.name.as_str()))
        .filter(|block| {
            block.parent.is_empty() || COMPOSABLE_CHILD_BLOCKS.contains(&block.name.as_str())
        })
        .filter(|block| allow.is_allowed(&block.name))
        .collect()
}

/// Attribute names listed per block in the prompt.
const PROMPT_ATTRIBUTE_LIMIT: usize = 8;

/// Compact "Available Blocks" listing of the composable blocks, or an empty
/// string when there are none.
pub fn to_prompt_text(registry: &dyn BlockRegistry, allow: &AllowList) -> String {
    let composable = composable_blocks(registry, allow);
    if composable.is_empty() {
        return String::new();
    }

    let mut lines = vec!["## Available Blocks\n".to_string()];
    for block in composable {
        let mut line = format!("- **{}**", block.name);
        if !block.title.is_empty() && block.title != block.name {
            line.push_str(&format!(" ({})", block.title));
        }
        if !block.description.is_empty() {
            line.push_str(&format!(": {}", block.description));
        }

        let attributes: Vec<&str> = block
            .attributes
            .iter()
            .map(String::as_str)
            .filter(|name| !name.starts_with('_'))
            .collect();
        if !attributes.is_empty() {
            let shown = attributes.len().min(PROMPT_ATTRIBUTE_LIMIT);
            line.push_str(&format!(" - attrs: {}", attributes[..shown].join(", ")));
            if attributes.len() > PROMPT_ATTRIBUTE_LIMIT {
                line.push_str(", ...");
            }
        }

        if registry.supports_inner_blocks(&block.name) {
            line.push_str(" [supports innerBlocks]");
        }
        lines.push(line);
    }

    lines.join("\n")
}
