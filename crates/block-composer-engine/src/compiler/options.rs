use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::manifest::Definition;
use crate::node::Node;

/// Class token marking the node that receives a pattern's content.
pub const DEFAULT_SLOT_CLASS: &str = "ai-composer-slot";

/// Tunables for a compile pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Deepest definition or pattern node nesting accepted by validation.
    pub max_depth: usize,
    /// Longest attribute string, in bytes, accepted by validation.
    pub max_field_length: usize,
    pub slot_class: String,
    /// Pattern slugs treated as sections by the coalescer, in addition to
    /// any slug containing `section`.
    pub section_patterns: Vec<String>,
    /// Blocks that take injected content even when the registry does not
    /// flag them as containers.
    pub fallback_containers: Vec<String>,
    /// Section scaffolds suggested to the model, first registered wins.
    pub preferred_section_patterns: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_field_length: 64 * 1024,
            slot_class: DEFAULT_SLOT_CLASS.to_string(),
            section_patterns: ["ai-composer/section", "ai-composer/nectar-section"]
                .map(String::from)
                .to_vec(),
            fallback_containers: [
                "core/group",
                "core/columns",
                "core/column",
                "core/cover",
                "core/buttons",
                "core/list",
                "core/quote",
                "nectar-blocks/row",
                "nectar-blocks/column",
            ]
            .map(String::from)
            .to_vec(),
            preferred_section_patterns: ["ai-composer/nectar-section", "ai-composer/section"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl CompilerOptions {
    /// Whether `slug` names a section-style pattern.
    pub fn is_section_pattern(&self, slug: &str) -> bool {
        self.section_patterns.iter().any(|s| s == slug) || slug.contains("section")
    }
}

type DefinitionHook = Rc<dyn Fn(Vec<Definition>) -> Vec<Definition>>;
type TreeHook = Rc<dyn Fn(Vec<Node>) -> Vec<Node>>;

/// Optional transforms applied between compile stages.
#[derive(Clone, Default)]
pub struct Hooks {
    pub post_coalesce: Option<DefinitionHook>,
    pub post_build: Option<TreeHook>,
    pub pre_serialize: Option<TreeHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs on coalesced definitions, before validation.
    pub fn post_coalesce(mut self, hook: impl Fn(Vec<Definition>) -> Vec<Definition> + 'static) -> Self {
        self.post_coalesce = Some(Rc::new(hook));
        self
    }

    /// Runs on the built tree, before it is returned.
    pub fn post_build(mut self, hook: impl Fn(Vec<Node>) -> Vec<Node> + 'static) -> Self {
        self.post_build = Some(Rc::new(hook));
        self
    }

    /// Runs on a copy of the tree right before serialization.
    pub fn pre_serialize(mut self, hook: impl Fn(Vec<Node>) -> Vec<Node> + 'static) -> Self {
        self.pre_serialize = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("post_coalesce", &self.post_coalesce.is_some())
            .field("post_build", &self.post_build.is_some())
            .field("pre_serialize", &self.pre_serialize.is_some())
            .finish()
    }
}
