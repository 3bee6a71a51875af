//! # Manifest Compiler
//!
//! One compile pass turns a decoded [`Manifest`] into concrete nodes and
//! markup:
//!
//! 1. **`coalesce`**: section patterns absorb the loose siblings after them
//! 2. **`validate`**: every violation in the coalesced manifest is collected
//! 3. **`build`**: definitions become nodes, patterns are expanded
//! 4. **`inject`**: content for a pattern lands in its slot
//!
//! The registry adapters are borrowed for the whole pass and the allow-list
//! is read once, on first use. Optional [`Hooks`] can rewrite the
//! intermediate results between stages.

pub mod build;
pub mod coalesce;
pub mod inject;
pub mod options;
pub mod validate;

use std::cell::OnceCell;

use crate::error::ComposeError;
use crate::grammar::serialize_blocks;
use crate::manifest::{Definition, Manifest};
use crate::node::Node;
use crate::registry::{AllowList, BlockRegistry, PatternCatalog, SettingsStore};

pub use options::{CompilerOptions, Hooks};

/// Output of a full compile pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub tree: Vec<Node>,
    pub grammar: String,
}

/// Compiles manifests against one snapshot of the site registries.
pub struct ManifestCompiler<'a> {
    blocks: &'a dyn BlockRegistry,
    patterns: &'a dyn PatternCatalog,
    settings: &'a dyn SettingsStore,
    options: CompilerOptions,
    hooks: Hooks,
    allowed: OnceCell<AllowList>,
}

impl<'a> ManifestCompiler<'a> {
    pub fn new(
        blocks: &'a dyn BlockRegistry,
        patterns: &'a dyn PatternCatalog,
        settings: &'a dyn SettingsStore,
    ) -> Self {
        Self {
            blocks,
            patterns,
            settings,
            options: CompilerOptions::default(),
            hooks: Hooks::default(),
            allowed: OnceCell::new(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// The allow-list snapshot for this pass.
    pub fn allow_list(&self) -> &AllowList {
        self.allowed
            .get_or_init(|| AllowList::from_settings(self.settings))
    }

    pub fn is_block_allowed(&self, name: &str) -> bool {
        self.allow_list().is_allowed(name)
    }

    /// Merges section patterns with their trailing siblings, then runs the
    /// post-coalesce hook.
    pub fn coalesce(&self, definitions: Vec<Definition>) -> Vec<Definition> {
        let coalesced = coalesce::coalesce(definitions, &self.options);
        match &self.hooks.post_coalesce {
            Some(hook) => hook(coalesced),
            None => coalesced,
        }
    }

    /// Coalesces and validates the manifest without building anything.
    pub fn validate(&self, manifest: &Manifest) -> Result<(), ComposeError> {
        if manifest.blocks.is_empty() {
            return Err(ComposeError::EmptyManifest);
        }
        let coalesced = self.coalesce(manifest.blocks.clone());
        self.validate_definitions(&coalesced)
    }

    /// Validates already-coalesced definitions.
    pub fn validate_definitions(&self, definitions: &[Definition]) -> Result<(), ComposeError> {
        let violations = validate::Validator::new(self).run(definitions);
        if violations.is_empty() {
            Ok(())
        } else {
            log::debug!("Manifest rejected with {} violation(s)", violations.len());
            Err(ComposeError::validation(violations))
        }
    }

    /// Coalesces, validates and builds the node tree. No partial tree is
    /// returned on failure.
    pub fn to_block_tree(&self, manifest: &Manifest) -> Result<Vec<Node>, ComposeError> {
        if manifest.blocks.is_empty() {
            return Err(ComposeError::EmptyManifest);
        }

        let coalesced = self.coalesce(manifest.blocks.clone());
        self.validate_definitions(&coalesced)?;

        let tree = self.build_nodes(&coalesced, "blocks")?;
        log::debug!(
            "Built {} node(s) from {} definition(s)",
            crate::node::count_nodes(&tree),
            coalesced.len()
        );

        Ok(match &self.hooks.post_build {
            Some(hook) => hook(tree),
            None => tree,
        })
    }

    /// Serializes a tree after running the pre-serialize hook.
    pub fn serialize(&self, tree: &[Node]) -> String {
        match &self.hooks.pre_serialize {
            Some(hook) => serialize_blocks(&hook(tree.to_vec())),
            None => serialize_blocks(tree),
        }
    }

    /// Compiles a manifest to block markup.
    pub fn compile(&self, manifest: &Manifest) -> Result<String, ComposeError> {
        Ok(self.compile_all(manifest)?.grammar)
    }

    /// Compiles a manifest once, returning both the tree and its markup.
    pub fn compile_all(&self, manifest: &Manifest) -> Result<Compilation, ComposeError> {
        let tree = self.to_block_tree(manifest)?;
        let grammar = self.serialize(&tree);
        Ok(Compilation { tree, grammar })
    }

    fn is_container(&self, name: &str) -> bool {
        self.blocks.supports_inner_blocks(name)
            || self.options.fallback_containers.iter().any(|c| c == name)
    }
}
