use super::{ManifestCompiler, inject::inject, validate::invalid_kind};
use crate::attributes::normalize;
use crate::error::{ComposeError, ExpansionError, Violation};
use crate::grammar::parse_blocks;
use crate::manifest::Definition;
use crate::node::Node;

impl ManifestCompiler<'_> {
    /// Builds nodes for a list of definitions, concatenating the results.
    pub fn build_nodes(&self, definitions: &[Definition], path: &str) -> Result<Vec<Node>, ComposeError> {
        let mut nodes = Vec::with_capacity(definitions.len());
        for (i, definition) in definitions.iter().enumerate() {
            nodes.extend(self.build_definition(definition, &format!("{path}[{i}]"))?);
        }
        Ok(nodes)
    }

    /// Builds the nodes for one definition.
    ///
    /// A block yields exactly one node. A pattern yields its expanded nodes,
    /// with any inner content injected into them.
    pub fn build_definition(&self, definition: &Definition, path: &str) -> Result<Vec<Node>, ComposeError> {
        match definition {
            Definition::Block(block) => {
                let children = self.build_nodes(&block.inner_blocks, &format!("{path}.innerBlocks"))?;
                Ok(vec![
                    Node::new(block.block_type.clone())
                        .with_attributes(normalize(&block.attributes))
                        .with_children(children),
                ])
            }
            Definition::Pattern(pattern) => {
                let expanded = self.pattern_to_nodes(&pattern.slug)?;
                if pattern.inner_blocks.is_empty() {
                    return Ok(expanded);
                }
                let content = self.build_nodes(&pattern.inner_blocks, &format!("{path}.innerBlocks"))?;
                Ok(inject(expanded, content, &self.options.slot_class, |name| {
                    self.is_container(name)
                }))
            }
            // Only reachable when a hook or caller skipped validation.
            Definition::Invalid(invalid) => Err(ComposeError::validation(vec![Violation::new(
                path,
                invalid_kind(invalid),
            )])),
        }
    }

    /// Expands a registered pattern into nodes.
    pub fn pattern_to_nodes(&self, slug: &str) -> Result<Vec<Node>, ExpansionError> {
        if slug.is_empty() {
            return Err(ExpansionError::PatternSlugMissing);
        }
        let content = self
            .patterns
            .pattern_content(slug)
            .ok_or_else(|| ExpansionError::PatternNotFound(slug.to_string()))?;

        parse_blocks(content).map_err(|source| ExpansionError::PatternParse {
            slug: slug.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::ManifestCompiler;
    use crate::error::{ComposeError, ExpansionError};
    use crate::manifest::{Definition, Manifest};
    use crate::node::Node;
    use crate::registry::{Pattern, PatternLibrary, StaticSettings};
    use crate::tests::{fixture_blocks, fixture_patterns, heading, paragraph, section};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn heading_attributes_are_cast() {
        let blocks = fixture_blocks();
        let patterns = fixture_patterns(&blocks);
        let settings = StaticSettings::default();
        let compiler = ManifestCompiler::new(&blocks, &patterns, &settings);

        let tree = compiler
            .to_block_tree(&Manifest::new(vec![heading(2, "Hello")], ""))
            .unwrap();

        assert_eq!(
            tree,
            vec![
                Node::new("core/heading")
                    .with_attribute("level", json!(2))
                    .with_attribute("content", json!("Hello"))
            ]
        );
    }

    #[test]
    fn section_content_lands_in_the_slot() {
        let blocks = fixture_blocks();
        let patterns = fixture_patterns(&blocks);
        let settings = StaticSettings::default();
        let compiler = ManifestCompiler::new(&blocks, &patterns, &settings);

        let tree = compiler
            .to_block_tree(&Manifest::new(
                vec![section("ai-composer/section", vec![paragraph("Inside")])],
                "",
            ))
            .unwrap();

        assert_eq!(tree.len(), 1);
        let slot = &tree[0].children[0];
        assert!(slot.has_class("ai-composer-slot"));
        assert_eq!(
            slot.children,
            vec![Node::new("core/paragraph").with_attribute("content", json!("Inside"))]
        );
    }

    #[test]
    fn pattern_without_content_is_expanded_as_is() {
        let blocks = fixture_blocks();
        let patterns = fixture_patterns(&blocks);
        let settings = StaticSettings::default();
        let compiler = ManifestCompiler::new(&blocks, &patterns, &settings);

        let tree = compiler
            .to_block_tree(&Manifest::new(vec![section("ai-composer/section", vec![])], ""))
            .unwrap();
        assert_eq!(tree, compiler.pattern_to_nodes("ai-composer/section").unwrap());
    }

    #[test]
    fn expansion_failures_have_their_own_codes() {
        let blocks = fixture_blocks();
        let patterns = PatternLibrary::new([Pattern::new("theme/broken", "<!-- wp:group -->")]);
        let settings = StaticSettings::default();
        let compiler = ManifestCompiler::new(&blocks, &patterns, &settings);

        assert!(matches!(
            compiler.pattern_to_nodes(""),
            Err(ExpansionError::PatternSlugMissing)
        ));
        assert!(matches!(
            compiler.pattern_to_nodes("theme/absent"),
            Err(ExpansionError::PatternNotFound(slug)) if slug == "theme/absent"
        ));

        let err = compiler
            .to_block_tree(&Manifest::new(vec![Definition::pattern("theme/broken", vec![])], ""))
            .unwrap_err();
        assert_eq!(err.code(), "ai_composer_pattern_parse_failed");
        assert!(matches!(err, ComposeError::Expansion(ExpansionError::PatternParse { .. })));
    }

    #[test]
    fn invalid_definitions_never_build() {
        let blocks = fixture_blocks();
        let patterns = fixture_patterns(&blocks);
        let settings = StaticSettings::default();
        let compiler = ManifestCompiler::new(&blocks, &patterns, &settings);

        let err = compiler
            .build_definition(&Definition::from_value(&json!(42)), "blocks[3]")
            .unwrap_err();
        assert_eq!(err.to_string(), "blocks[3] must be an object.");
    }
}
