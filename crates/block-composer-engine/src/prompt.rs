//! System prompt and output schema sent to the provider.

use serde_json::{Value, json};

use crate::composer::{ComposeMode, ComposeOptions};
use crate::registry::{AllowList, BlockRegistry, PatternCatalog, SettingsStore, blocks, patterns};

/// Context limits, in characters, for the optimize-mode sections.
const SELECTED_BLOCK_CONTEXT_LIMIT: usize = 8000;
const PAGE_CONTEXT_LIMIT: usize = 16000;

const DEFAULT_SITE_NAME: &str = "this WordPress site";

const OUTPUT_FORMAT: &str = r#"## Output Format

Return a JSON object with:
- `blocks`: an ordered array of block definitions.
- `summary`: a one-sentence summary of what you composed.

Every block MUST have all four fields: `blockType`, `attributes`, `patternSlug`, `innerBlocks`.

Block definition examples:
```
{
  "blockType": "core/heading",
  "attributes": [
    {"name": "level", "value": "2"},
    {"name": "content", "value": "Section Title"}
  ],
  "patternSlug": null,
  "innerBlocks": []
}
```

```
{
  "blockType": "core/group",
  "attributes": [],
  "patternSlug": null,
  "innerBlocks": [
    {
      "blockType": "core/paragraph",
      "attributes": [{"name": "content", "value": "Hello world."}],
      "patternSlug": null,
      "innerBlocks": []
    }
  ]
}
```

For pattern references:
```
{
  "blockType": "pattern",
  "attributes": [],
  "patternSlug": "theme-namespace/pattern-name",
  "innerBlocks": []
}
```

For section pattern with nested content:
```
{
  "blockType": "pattern",
  "attributes": [],
  "patternSlug": "theme-namespace/section",
  "innerBlocks": [
    {
      "blockType": "core/heading",
      "attributes": [{"name": "level", "value": "2"}, {"name": "content", "value": "Inside the section"}],
      "patternSlug": null,
      "innerBlocks": []
    }
  ]
}
```"#;

/// Builds provider instructions from the current registries and settings.
pub struct PromptEngine<'a> {
    blocks: &'a dyn BlockRegistry,
    patterns: &'a dyn PatternCatalog,
    settings: &'a dyn SettingsStore,
    preferred_section_patterns: Vec<String>,
}

impl<'a> PromptEngine<'a> {
    pub fn new(
        blocks: &'a dyn BlockRegistry,
        patterns: &'a dyn PatternCatalog,
        settings: &'a dyn SettingsStore,
    ) -> Self {
        Self {
            blocks,
            patterns,
            settings,
            preferred_section_patterns: crate::CompilerOptions::default().preferred_section_patterns,
        }
    }

    pub fn with_preferred_section_patterns(mut self, slugs: Vec<String>) -> Self {
        self.preferred_section_patterns = slugs;
        self
    }

    /// The full system prompt for one request. Empty sections are skipped
    /// and the rest are separated by blank lines.
    pub fn system_prompt(&self, options: &ComposeOptions) -> String {
        let allow = AllowList::from_settings(self.settings);
        let mut sections = Vec::new();

        let prepend = self.settings.system_prompt_prepend();
        if !prepend.trim().is_empty() {
            sections.push(format!(
                "## Custom System Instructions (Prepend)\n{}",
                prepend.trim()
            ));
        }

        sections.push(self.role_section());
        sections.push(blocks::to_prompt_text(self.blocks, &allow));
        sections.push(patterns::to_prompt_text(self.patterns));
        sections.push(self.theme_strategy_section());
        sections.push(self.rules_section(&allow));
        sections.push(OUTPUT_FORMAT.to_string());

        if let Some(template) = options.template.as_deref()
            && !template.is_empty()
        {
            sections.push(format!(
                "## Page Template Constraint\nThis page uses the `{template}` template. Compose blocks appropriate for that template."
            ));
        }

        match options.compose_mode {
            ComposeMode::SelectedBlock => {
                if let Some(context) = &options.selected_block_context {
                    sections.push(optimize_block_section(context));
                }
            }
            ComposeMode::Page => {
                if let Some(context) = &options.page_context {
                    sections.push(optimize_page_section(context));
                }
            }
            ComposeMode::NewContent => {}
        }

        let append = self.settings.system_prompt_append();
        if !append.trim().is_empty() {
            sections.push(format!(
                "## Custom System Instructions (Append)\n{}",
                append.trim()
            ));
        }

        sections.retain(|s| !s.is_empty());
        sections.join("\n\n")
    }

    /// The strict output schema: `{blocks, summary}` with block objects
    /// nested three levels deep and every property required.
    pub fn output_schema() -> Value {
        let pair = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Attribute name (e.g. level, content, url, alt)."},
                "value": {"type": "string", "description": "Attribute value as a string. Stringify numbers and booleans (e.g. \"2\", \"true\")."}
            },
            "required": ["name", "value"],
            "additionalProperties": false
        });

        let level3 = json!({
            "type": "object",
            "properties": {
                "blockType": {"type": "string", "description": "Block type identifier."},
                "attributes": {"type": "array", "items": pair, "description": "Block attributes as name-value pairs."},
                "patternSlug": {"type": ["string", "null"], "description": "Pattern slug when blockType is \"pattern\", otherwise null."}
            },
            "required": ["blockType", "attributes", "patternSlug"],
            "additionalProperties": false
        });

        let level2 = json!({
            "type": "object",
            "properties": {
                "blockType": {"type": "string", "description": "Block type identifier."},
                "attributes": {"type": "array", "items": pair, "description": "Block attributes as name-value pairs."},
                "patternSlug": {"type": ["string", "null"], "description": "Pattern slug when blockType is \"pattern\", otherwise null."},
                "innerBlocks": {"type": "array", "items": level3, "description": "Third-level nested blocks."}
            },
            "required": ["blockType", "attributes", "patternSlug", "innerBlocks"],
            "additionalProperties": false
        });

        let level1 = json!({
            "type": "object",
            "properties": {
                "blockType": {
                    "type": "string",
                    "description": "Block type identifier (e.g. core/heading, core/group, acf/my-block) or \"pattern\" for pattern references."
                },
                "attributes": {
                    "type": "array",
                    "items": pair,
                    "description": "Block attributes as name-value pairs. For headings: [{name:\"level\",value:\"2\"},{name:\"content\",value:\"Title\"}]."
                },
                "patternSlug": {
                    "type": ["string", "null"],
                    "description": "When blockType is \"pattern\", the registered pattern slug. Otherwise null."
                },
                "innerBlocks": {
                    "type": "array",
                    "items": level2,
                    "description": "Nested blocks for containers like core/group, core/columns, core/column."
                }
            },
            "required": ["blockType", "attributes", "patternSlug", "innerBlocks"],
            "additionalProperties": false
        });

        json!({
            "type": "object",
            "properties": {
                "blocks": {
                    "type": "array",
                    "items": level1,
                    "description": "Ordered array of top-level blocks that compose the page."
                },
                "summary": {
                    "type": "string",
                    "description": "One-sentence summary of the composition."
                }
            },
            "required": ["blocks", "summary"],
            "additionalProperties": false
        })
    }

    /// First preferred section scaffold that is registered.
    pub fn preferred_section_pattern(&self) -> Option<&str> {
        self.preferred_section_patterns
            .iter()
            .map(String::as_str)
            .find(|slug| self.patterns.pattern_exists(slug))
    }

    fn role_section(&self) -> String {
        let site_name = self
            .settings
            .site_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string());

        format!(
            "# Role\n\n\
             You are an AI page composer for {site_name}. Your job is to take a user's natural-language page description and produce a structured composition manifest using the site's available blocks and patterns.\n\n\
             Create clean, production-ready layouts. Prefer reusable patterns when they match intent. Avoid unnecessary wrappers and over-nesting."
        )
    }

    fn is_nectar_ecosystem(&self) -> bool {
        self.blocks.block_exists("nectar-blocks/row") || self.blocks.block_exists("nectar-blocks/column")
    }

    fn theme_strategy_section(&self) -> String {
        if !self.settings.theme_strategy_enabled() || !self.is_nectar_ecosystem() {
            return String::new();
        }

        let mut lines = vec![
            "## Theme Strategy: Nectar Ecosystem Detected".to_string(),
            "Nectar Blocks are available. Favor Nectar-style section composition over generic wrappers.".to_string(),
        ];
        match self.preferred_section_pattern() {
            Some(slug) => {
                lines.push(format!("Preferred section scaffold pattern: `{slug}`."));
                lines.push(
                    "Use this as the default top-level section wrapper whenever the user asks for sections/rows."
                        .to_string(),
                );
            }
            None => lines.push(
                "No Nectar section pattern slug is available; compose using available Nectar row/column blocks directly."
                    .to_string(),
            ),
        }
        lines.push(
            "When using Nectar blocks, keep nesting shallow and content focused inside column containers."
                .to_string(),
        );

        lines.join("\n")
    }

    fn rules_section(&self, allow: &AllowList) -> String {
        let composable: Vec<&str> = blocks::composable_blocks(self.blocks, allow)
            .into_iter()
            .map(|b| b.name.as_str())
            .collect();
        let has = |name: &str| composable.contains(&name);

        let mut lines = vec![
            "## Composition Rules".to_string(),
            String::new(),
            "1. Only use block types listed in \"Available Blocks\" or pattern slugs from \"Available Patterns\".".to_string(),
        ];

        lines.push(match self.preferred_section_pattern() {
            Some(slug) => format!(
                "2. For page sections, prefer the `{slug}` pattern before manually composing wrappers."
            ),
            None => "2. Prefer existing patterns before manual composition.".to_string(),
        });

        lines.push(if has("core/group") {
            "3. Use `core/group` sparingly: only for real section boundaries. Do NOT wrap single standalone blocks in an unnecessary group."
        } else {
            "3. Do not use `core/group` unless it appears in Available Blocks."
        }
        .to_string());

        lines.push(if has("core/columns") && has("core/column") {
            "4. Use `core/columns` + `core/column` for side-by-side layouts. Always place content blocks inside `core/column`, never directly inside `core/columns`."
        } else {
            "4. If column blocks are unavailable, use vertical stacking instead of simulating columns."
        }
        .to_string());

        lines.extend(
            [
                "5. For headings, use descending levels: h1 > h2 > h3. Only one h1 per page.",
                "6. To reference a pattern, set `blockType` to `\"pattern\"` and `patternSlug` to the pattern's registered slug.",
                "7. When using a section-style pattern, place section content INSIDE that pattern by populating the pattern block's `innerBlocks`.",
                "8. Do not output a section pattern followed by unrelated sibling content unless you are intentionally starting a new section.",
                "9. For ACF blocks (prefixed `acf/`), place known field values in attributes with name `data.field_name`.",
                "10. Use filler/placeholder text when the user does not provide specific content.",
                "11. Keep the manifest compact. Do not over-nest blocks.",
                "12. Never invent block types. If unsure whether a block exists, use core blocks that are listed as available.",
                "13. All attribute values MUST be strings. Stringify numbers (\"2\"), booleans (\"true\"/\"false\"), and JSON objects.",
                "14. Always set `patternSlug` to null when `blockType` is not \"pattern\".",
                "15. Always set `innerBlocks` to an empty array `[]` when the block has no children.",
            ]
            .map(String::from),
        );

        lines.join("\n")
    }
}

fn truncated_json(context: &Value, limit: usize) -> Option<String> {
    if context.is_null() {
        return None;
    }
    let json = serde_json::to_string_pretty(context).ok()?;
    Some(json.chars().take(limit).collect())
}

fn optimize_block_section(context: &Value) -> String {
    let Some(json) = truncated_json(context, SELECTED_BLOCK_CONTEXT_LIMIT) else {
        return String::new();
    };
    format!(
        "## Optimize Mode: Selected Block\n\n\
         The user wants to optimize/improve an existing block. Below is the current block structure.\n\
         Rewrite and improve it based on the user's prompt while preserving block type compatibility.\n\
         Return the improved block(s) in the same manifest format.\n\n\
         Current block:\n```json\n{json}\n```"
    )
}

fn optimize_page_section(context: &Value) -> String {
    let Some(json) = truncated_json(context, PAGE_CONTEXT_LIMIT) else {
        return String::new();
    };
    format!(
        "## Optimize Mode: Entire Page\n\n\
         The user wants to optimize/improve the entire page. Below is the current page block structure.\n\
         Rewrite and improve it based on the user's prompt while preserving block type compatibility.\n\
         Return the full improved page in the same manifest format.\n\n\
         Current page blocks:\n```json\n{json}\n```"
    )
}
