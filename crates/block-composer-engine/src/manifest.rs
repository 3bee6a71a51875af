//! Decoded model output.
//!
//! Model output is untrusted and loosely shaped, so each entry is decided
//! exactly once into a [`Definition`] variant. Entries too malformed to be a
//! block or a pattern reference are kept as [`Definition::Invalid`] so the
//! validator can report them at their (coalesced) position.

use serde_json::{Map, Value, json};

use crate::error::ComposeError;

/// The decoded manifest: `{ blocks, summary }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub blocks: Vec<Definition>,
    pub summary: String,
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Block(BlockDefinition),
    Pattern(PatternDefinition),
    Invalid(InvalidDefinition),
}

/// A concrete block reference such as `core/heading`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefinition {
    pub block_type: String,
    /// Raw attributes as emitted by the model, normalized at build time.
    pub attributes: Value,
    pub inner_blocks: Vec<Definition>,
}

/// A reference to a registered pattern, with optional content to inject.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDefinition {
    pub slug: String,
    pub inner_blocks: Vec<Definition>,
}

/// Why an entry could not be decided into a block or pattern reference.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidDefinition {
    NotAnObject,
    MissingBlockType,
    /// `blockType` is `"pattern"` but no slug was given.
    MissingPatternSlug,
    /// A concrete block whose `innerBlocks` is present but not an array.
    InnerBlocksNotArray { block_type: String },
}

pub const PATTERN_BLOCK_TYPE: &str = "pattern";

impl Manifest {
    pub fn new(blocks: Vec<Definition>, summary: impl Into<String>) -> Self {
        Self {
            blocks,
            summary: summary.into(),
        }
    }

    /// Decodes raw model text.
    pub fn from_json(raw: &str) -> Result<Self, ComposeError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ComposeError::InvalidManifest(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Decodes an already-parsed JSON document.
    ///
    /// The document must be an object with a non-empty `blocks` array.
    pub fn from_value(value: &Value) -> Result<Self, ComposeError> {
        let Some(object) = value.as_object() else {
            return Err(ComposeError::InvalidManifest(
                "manifest must be a JSON object".to_string(),
            ));
        };

        let blocks = match object.get("blocks") {
            Some(Value::Array(items)) if !items.is_empty() => {
                items.iter().map(Definition::from_value).collect()
            }
            _ => return Err(ComposeError::EmptyManifest),
        };

        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self { blocks, summary })
    }

    /// Re-encodes the manifest in the provider's output schema shape.
    pub fn to_value(&self) -> Value {
        json!({
            "blocks": self.blocks.iter().map(Definition::to_value).collect::<Vec<_>>(),
            "summary": self.summary,
        })
    }
}

impl Definition {
    pub fn block(block_type: impl Into<String>, attributes: Value, inner_blocks: Vec<Definition>) -> Self {
        Definition::Block(BlockDefinition {
            block_type: block_type.into(),
            attributes,
            inner_blocks,
        })
    }

    pub fn pattern(slug: impl Into<String>, inner_blocks: Vec<Definition>) -> Self {
        Definition::Pattern(PatternDefinition {
            slug: slug.into(),
            inner_blocks,
        })
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Definition::Invalid(InvalidDefinition::NotAnObject);
        };

        let block_type = object
            .get("blockType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if block_type.is_empty() {
            return Definition::Invalid(InvalidDefinition::MissingBlockType);
        }

        let inner_blocks = match object.get("innerBlocks") {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::Array(items)) => Some(items.iter().map(Definition::from_value).collect()),
            Some(_) => None,
        };

        if block_type == PATTERN_BLOCK_TYPE {
            let slug = object
                .get("patternSlug")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if slug.is_empty() {
                return Definition::Invalid(InvalidDefinition::MissingPatternSlug);
            }
            return Definition::pattern(slug, inner_blocks.unwrap_or_default());
        }

        let Some(inner_blocks) = inner_blocks else {
            return Definition::Invalid(InvalidDefinition::InnerBlocksNotArray {
                block_type: block_type.to_string(),
            });
        };

        let attributes = object.get("attributes").cloned().unwrap_or(Value::Null);
        Definition::block(block_type, attributes, inner_blocks)
    }

    /// Whether this entry references a pattern, even a malformed one.
    ///
    /// Pattern references stop sibling absorption during coalescing.
    pub fn is_pattern_reference(&self) -> bool {
        matches!(
            self,
            Definition::Pattern(_) | Definition::Invalid(InvalidDefinition::MissingPatternSlug)
        )
    }

    pub fn inner_blocks(&self) -> &[Definition] {
        match self {
            Definition::Block(block) => &block.inner_blocks,
            Definition::Pattern(pattern) => &pattern.inner_blocks,
            Definition::Invalid(_) => &[],
        }
    }

    pub fn inner_blocks_mut(&mut self) -> Option<&mut Vec<Definition>> {
        match self {
            Definition::Block(block) => Some(&mut block.inner_blocks),
            Definition::Pattern(pattern) => Some(&mut pattern.inner_blocks),
            Definition::Invalid(_) => None,
        }
    }

    /// Number of definitions in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.inner_blocks().iter().map(Definition::count).sum::<usize>()
    }

    pub fn to_value(&self) -> Value {
        match self {
            Definition::Block(block) => json!({
                "blockType": block.block_type,
                "attributes": block.attributes,
                "patternSlug": null,
                "innerBlocks": block.inner_blocks.iter().map(Definition::to_value).collect::<Vec<_>>(),
            }),
            Definition::Pattern(pattern) => json!({
                "blockType": PATTERN_BLOCK_TYPE,
                "attributes": [],
                "patternSlug": pattern.slug,
                "innerBlocks": pattern.inner_blocks.iter().map(Definition::to_value).collect::<Vec<_>>(),
            }),
            Definition::Invalid(InvalidDefinition::NotAnObject) => Value::Null,
            Definition::Invalid(InvalidDefinition::MissingBlockType) => {
                Value::Object(Map::new())
            }
            Definition::Invalid(InvalidDefinition::MissingPatternSlug) => json!({
                "blockType": PATTERN_BLOCK_TYPE,
                "patternSlug": null,
            }),
            Definition::Invalid(InvalidDefinition::InnerBlocksNotArray { block_type }) => json!({
                "blockType": block_type,
                "innerBlocks": null,
            }),
        }
    }
}
