use serde_json::Value;

use super::ManifestCompiler;
use crate::error::{Violation, ViolationKind};
use crate::grammar::parse_blocks;
use crate::manifest::{Definition, InvalidDefinition};
use crate::node::Node;

/// Root path segment of every violation.
pub const ROOT_PATH: &str = "blocks";

/// The violation an undecodable entry stands for.
pub fn invalid_kind(invalid: &InvalidDefinition) -> ViolationKind {
    match invalid {
        InvalidDefinition::NotAnObject => ViolationKind::NotAnObject,
        InvalidDefinition::MissingBlockType => ViolationKind::MissingBlockType,
        InvalidDefinition::MissingPatternSlug => ViolationKind::MissingPatternSlug,
        InvalidDefinition::InnerBlocksNotArray { .. } => ViolationKind::InnerBlocksNotArray,
    }
}

/// Collects every violation in a definition tree.
///
/// The whole manifest is walked so a single error can list every problem at
/// once. A block that fails the registry or allow-list check is reported
/// alone: its attributes and inner blocks are not examined.
pub struct Validator<'c, 'a> {
    compiler: &'c ManifestCompiler<'a>,
    violations: Vec<Violation>,
}

impl<'c, 'a> Validator<'c, 'a> {
    pub fn new(compiler: &'c ManifestCompiler<'a>) -> Self {
        Self {
            compiler,
            violations: Vec::new(),
        }
    }

    pub fn run(mut self, definitions: &[Definition]) -> Vec<Violation> {
        self.definitions(definitions, ROOT_PATH, 1);
        self.violations
    }

    fn push(&mut self, path: &str, kind: ViolationKind) {
        self.violations.push(Violation::new(path, kind));
    }

    fn definitions(&mut self, definitions: &[Definition], path: &str, depth: usize) {
        for (i, definition) in definitions.iter().enumerate() {
            let item = format!("{path}[{i}]");
            if depth > self.compiler.options.max_depth {
                self.push(
                    &item,
                    ViolationKind::TooDeep {
                        max_depth: self.compiler.options.max_depth,
                    },
                );
                continue;
            }
            self.definition(definition, &item, depth);
        }
    }

    fn definition(&mut self, definition: &Definition, path: &str, depth: usize) {
        match definition {
            Definition::Invalid(InvalidDefinition::InnerBlocksNotArray { block_type }) => {
                if self.block_policy(block_type, path) {
                    self.push(path, ViolationKind::InnerBlocksNotArray);
                }
            }
            Definition::Invalid(invalid) => self.push(path, invalid_kind(invalid)),
            Definition::Pattern(pattern) => {
                if self.compiler.patterns.pattern_exists(&pattern.slug) {
                    self.pattern_content(&pattern.slug, path, depth);
                } else {
                    self.push(
                        path,
                        ViolationKind::UnknownPattern {
                            slug: pattern.slug.clone(),
                        },
                    );
                }
                self.definitions(&pattern.inner_blocks, &format!("{path}.innerBlocks"), depth + 1);
            }
            Definition::Block(block) => {
                if !self.block_policy(&block.block_type, path) {
                    return;
                }
                self.field_sizes(&block.attributes, path);
                self.definitions(&block.inner_blocks, &format!("{path}.innerBlocks"), depth + 1);
            }
        }
    }

    /// Whether `name` is registered and allowed. Records the violation if not.
    fn block_policy(&mut self, name: &str, path: &str) -> bool {
        if !self.compiler.blocks.block_exists(name) {
            self.push(path, ViolationKind::UnknownBlock { name: name.to_string() });
            false
        } else if !self.compiler.is_block_allowed(name) {
            self.push(path, ViolationKind::DisallowedBlock { name: name.to_string() });
            false
        } else {
            true
        }
    }

    fn field_sizes(&mut self, attributes: &Value, path: &str) {
        let max_length = self.compiler.options.max_field_length;
        if longest_string(attributes) > max_length {
            self.push(path, ViolationKind::FieldTooLarge { max_length });
        }
    }

    /// Checks the blocks a registered pattern expands to.
    fn pattern_content(&mut self, slug: &str, path: &str, depth: usize) {
        let Some(content) = self.compiler.patterns.pattern_content(slug) else {
            return;
        };
        match parse_blocks(content) {
            Ok(nodes) => self.pattern_nodes(&nodes, &format!("{path}.pattern({slug})"), depth + 1),
            // Reported by the build as an expansion failure.
            Err(e) => log::warn!("Pattern {slug} has malformed content: {e}"),
        }
    }

    fn pattern_nodes(&mut self, nodes: &[Node], path: &str, depth: usize) {
        for (i, node) in nodes.iter().enumerate() {
            let item = format!("{path}[{i}]");
            if depth > self.compiler.options.max_depth {
                self.push(
                    &item,
                    ViolationKind::TooDeep {
                        max_depth: self.compiler.options.max_depth,
                    },
                );
                continue;
            }

            let name = node.name.clone();
            if !self.compiler.blocks.block_exists(&name) {
                self.push(&item, ViolationKind::PatternUnknownBlock { name });
            } else if !self.compiler.is_block_allowed(&name) {
                self.push(&item, ViolationKind::PatternDisallowedBlock { name });
            }
            self.pattern_nodes(&node.children, &format!("{item}.innerBlocks"), depth + 1);
        }
    }
}

/// Length in bytes of the longest string anywhere in `value`.
fn longest_string(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        Value::Array(items) => items.iter().map(longest_string).max().unwrap_or(0),
        Value::Object(map) => map.values().map(longest_string).max().unwrap_or(0),
        _ => 0,
    }
}
