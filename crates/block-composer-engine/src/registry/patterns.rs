use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BlockRegistry, PatternCatalog};

/// Namespace given to built-in and file-based patterns.
pub const PATTERN_NAMESPACE: &str = "ai-composer";

/// Category attached to built-in layouts.
pub const LAYOUT_CATEGORY: &str = "ai-composer-layouts";

const SECTION_CONTENT: &str = r#"<!-- wp:group {"align":"wide","layout":{"type":"constrained"},"className":"ai-composer-section"} -->
<div class="wp-block-group alignwide ai-composer-section"><!-- wp:group {"className":"ai-composer-slot"} -->
<div class="wp-block-group ai-composer-slot"></div>
<!-- /wp:group --></div>
<!-- /wp:group -->"#;

const NECTAR_SECTION_CONTENT: &str = r#"<!-- wp:nectar-blocks/row {"align":"full","containedContentWidth":true,"className":"ai-composer-section"} -->
<!-- wp:nectar-blocks/column {"columnSettings":{"desktop":{"width":"100.00%"}},"className":"ai-composer-slot"} -->
<!-- wp:nectar-blocks/text -->
<p class="wp-block-nectar-blocks-text nectar-blocks-text nectar-block"></p>
<!-- /wp:nectar-blocks/text -->
<!-- /wp:nectar-blocks/column -->
<!-- /wp:nectar-blocks/row -->"#;

/// A registered pattern: named markup expandable into nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pattern {
    pub name: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub content: String,
    /// Where the pattern came from (`builtin`, `file`, ...).
    pub source: String,
}

impl Pattern {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// A pattern named after a file stem, e.g. `hero-banner` becomes
    /// `ai-composer/hero-banner` titled "Hero Banner".
    pub fn from_slug(slug: &str, content: impl Into<String>) -> Self {
        let title = slug
            .split(['-', '_'])
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            name: format!("{PATTERN_NAMESPACE}/{slug}"),
            title,
            categories: vec![LAYOUT_CATEGORY.to_string()],
            content: content.into(),
            ..Self::default()
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

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Built-in section scaffolds, each with a dedicated content slot.
///
/// The Nectar scaffold is only offered when its row and column blocks are
/// registered.
pub fn builtin_patterns(blocks: &dyn BlockRegistry) -> Vec<Pattern> {
    let mut patterns = vec![Pattern {
        name: format!("{PATTERN_NAMESPACE}/section"),
        title: "Section".to_string(),
        description: "Generic section scaffold with a dedicated AI content slot.".to_string(),
        categories: vec![LAYOUT_CATEGORY.to_string()],
        keywords: ["section", "layout", "wrapper", "generic"]
            .map(String::from)
            .to_vec(),
        content: SECTION_CONTENT.to_string(),
        source: "builtin".to_string(),
    }];

    if blocks.block_exists("nectar-blocks/row") && blocks.block_exists("nectar-blocks/column") {
        patterns.push(Pattern {
            name: format!("{PATTERN_NAMESPACE}/nectar-section"),
            title: "Nectar Section".to_string(),
            description: "Nectar row/column section scaffold with a dedicated AI content slot."
                .to_string(),
            categories: vec![LAYOUT_CATEGORY.to_string()],
            keywords: ["nectar", "section", "row", "column"]
                .map(String::from)
                .to_vec(),
            content: NECTAR_SECTION_CONTENT.to_string(),
            source: "builtin".to_string(),
        });
    }

    patterns
}

/// In-memory pattern catalog.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: BTreeMap<String, Pattern>,
}

impl PatternLibrary {
    pub fn new(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        let mut library = Self::default();
        for pattern in patterns {
            library.register(pattern);
        }
        library
    }

    /// Registered patterns plus the built-in scaffolds. Registered patterns
    /// win over built-ins with the same name.
    pub fn with_builtins(patterns: impl IntoIterator<Item = Pattern>, blocks: &dyn BlockRegistry) -> Self {
        let mut library = Self::new(patterns);
        for builtin in builtin_patterns(blocks) {
            if library.patterns.contains_key(&builtin.name) {
                log::debug!("Registered pattern {} shadows the built-in", builtin.name);
                continue;
            }
            library.register(builtin);
        }
        library
    }

    /// Registers a pattern. Unnamed or empty patterns are skipped.
    pub fn register(&mut self, pattern: Pattern) {
        if pattern.name.trim().is_empty() {
            log::warn!("Skipping pattern registration without a name");
            return;
        }
        if pattern.content.trim().is_empty() {
            log::warn!("Skipping pattern {} with empty content", pattern.name);
            return;
        }
        self.patterns.insert(pattern.name.clone(), pattern);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl PatternCatalog for PatternLibrary {
    fn get_pattern(&self, slug: &str) -> Option<&Pattern> {
        self.patterns.get(slug)
    }

    fn patterns(&self) -> Vec<&Pattern> {
        self.patterns.values().collect()
    }
}

/// Compact "Available Patterns" listing. Pattern content is left out.
pub fn to_prompt_text(catalog: &dyn PatternCatalog) -> String {
    let patterns = catalog.patterns();
    if patterns.is_empty() {
        return String::new();
    }

    let mut lines = vec![
        "## Available Patterns\n".to_string(),
        "Use a pattern by setting `\"blockType\": \"pattern\"` and `\"patternSlug\": \"<slug>\"` in your manifest.".to_string(),
        "Patterns are pre-built layouts that will be resolved to block grammar automatically.\n".to_string(),
    ];
    for pattern in patterns {
        let mut line = format!("- **{}**", pattern.name);
        if !pattern.title.is_empty() && pattern.title != pattern.name {
            line.push_str(&format!(" - {}", pattern.title));
        }
        if !pattern.description.is_empty() {
            line.push_str(&format!(": {}", pattern.description));
        }
        if !pattern.categories.is_empty() {
            line.push_str(&format!(" [{}]", pattern.categories.join(", ")));
        }
        lines.push(line);
    }

    lines.join("\n")
}
