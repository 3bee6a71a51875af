//! End-to-end composition: prompt in, compiled page out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::str::FromStr;

use crate::compiler::{Compilation, CompilerOptions, Hooks, ManifestCompiler};
use crate::error::ComposeError;
use crate::manifest::Manifest;
use crate::node::Node;
use crate::prompt::PromptEngine;
use crate::registry::{BlockRegistry, PatternCatalog, SettingsStore};

/// Limits applied to editor context before it reaches the prompt.
const CONTEXT_MAX_DEPTH: usize = 8;
const CONTEXT_MAX_STRING: usize = 4000;
const CONTEXT_MAX_ENTRIES: usize = 500;
const CONTEXT_MAX_KEY: usize = 120;

/// A text-generation backend that answers under a JSON schema.
pub trait Provider {
    fn is_available(&self) -> bool {
        true
    }

    /// Returns the raw model text for `user_prompt`.
    fn generate(&self, system_prompt: &str, user_prompt: &str, schema: &Value) -> Result<String, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider is not configured: {0}")]
    NotConfigured(String),
    #[error("Provider request failed: {0}")]
    Request(String),
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// What the composition is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeMode {
    #[default]
    NewContent,
    /// Rewrite the block described by `selected_block_context`.
    SelectedBlock,
    /// Rewrite the page described by `page_context`.
    Page,
}

/// Where the editor puts the result. Carried through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    #[default]
    Append,
    ReplaceAll,
    InsertAfter,
}

impl FromStr for ComposeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_content" => Ok(ComposeMode::NewContent),
            "selected_block" => Ok(ComposeMode::SelectedBlock),
            "page" => Ok(ComposeMode::Page),
            other => Err(format!(
                "unknown compose mode '{other}' (expected new_content, selected_block or page)"
            )),
        }
    }
}

impl FromStr for InsertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(InsertMode::Append),
            "replace_all" => Ok(InsertMode::ReplaceAll),
            "insert_after" => Ok(InsertMode::InsertAfter),
            other => Err(format!(
                "unknown insert mode '{other}' (expected append, replace_all or insert_after)"
            )),
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Page template the composition must suit.
    pub template: Option<String>,
    pub compose_mode: ComposeMode,
    pub insert_mode: InsertMode,
    pub selected_block_context: Option<Value>,
    pub page_context: Option<Value>,
}

impl ComposeOptions {
    /// Copy with both context payloads passed through [`sanitize_context`].
    pub fn sanitized(&self) -> Self {
        Self {
            selected_block_context: self.selected_block_context.as_ref().map(sanitize_context),
            page_context: self.page_context.as_ref().map(sanitize_context),
            ..self.clone()
        }
    }
}

/// Trims an editor context payload to a prompt-safe size while keeping its
/// shape: anything nested deeper than 8 levels becomes null, strings are cut
/// to 4000 characters, containers keep their first 500 entries and keys are
/// cut to 120 characters.
pub fn sanitize_context(value: &Value) -> Value {
    sanitize_at(value, 0)
}

fn sanitize_at(value: &Value, depth: usize) -> Value {
    if depth > CONTEXT_MAX_DEPTH {
        return Value::Null;
    }
    match value {
        Value::String(s) => Value::String(truncate_chars(s, CONTEXT_MAX_STRING)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(CONTEXT_MAX_ENTRIES)
                .map(|item| sanitize_at(item, depth + 1))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, item) in map.iter().take(CONTEXT_MAX_ENTRIES) {
                out.insert(truncate_chars(key, CONTEXT_MAX_KEY), sanitize_at(item, depth + 1));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// A finished composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Serialized block markup.
    pub grammar: String,
    pub block_tree: Vec<Node>,
    /// The manifest as compiled, after the manifest hook.
    pub manifest: Manifest,
    pub summary: String,
}

impl Composition {
    /// JSON shape returned to editor clients.
    pub fn to_value(&self) -> Value {
        json!({
            "blocks": self.grammar,
            "blockTree": self.block_tree,
            "manifest": self.manifest.to_value(),
            "summary": self.summary,
        })
    }
}

type ManifestHook = Box<dyn Fn(Manifest, &str, &ComposeOptions) -> Manifest>;

/// Runs prompt construction, generation and compilation for one site.
pub struct Composer<'a> {
    blocks: &'a dyn BlockRegistry,
    patterns: &'a dyn PatternCatalog,
    settings: &'a dyn SettingsStore,
    provider: Option<&'a dyn Provider>,
    options: CompilerOptions,
    hooks: Hooks,
    manifest_hook: Option<ManifestHook>,
}

impl<'a> Composer<'a> {
    pub fn new(
        blocks: &'a dyn BlockRegistry,
        patterns: &'a dyn PatternCatalog,
        settings: &'a dyn SettingsStore,
    ) -> Self {
        Self {
            blocks,
            patterns,
            settings,
            provider: None,
            options: CompilerOptions::default(),
            hooks: Hooks::default(),
            manifest_hook: None,
        }
    }

    pub fn with_provider(mut self, provider: &'a dyn Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Hooks handed to every compile pass.
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Rewrites the decoded manifest before it is compiled.
    pub fn with_manifest_hook(
        mut self,
        hook: impl Fn(Manifest, &str, &ComposeOptions) -> Manifest + 'static,
    ) -> Self {
        self.manifest_hook = Some(Box::new(hook));
        self
    }

    pub fn prompt_engine(&self) -> PromptEngine<'a> {
        PromptEngine::new(self.blocks, self.patterns, self.settings)
            .with_preferred_section_patterns(self.options.preferred_section_patterns.clone())
    }

    /// A compiler over the same registries, options and hooks.
    pub fn compiler(&self) -> ManifestCompiler<'a> {
        ManifestCompiler::new(self.blocks, self.patterns, self.settings)
            .with_options(self.options.clone())
            .with_hooks(self.hooks.clone())
    }

    /// Composes a page for `prompt`.
    pub fn compose(&self, prompt: &str, options: &ComposeOptions) -> Result<Composition, ComposeError> {
        let provider = self
            .provider
            .filter(|p| p.is_available())
            .ok_or(ComposeError::NoProvider)?;

        let options = options.sanitized();
        let system_prompt = self.prompt_engine().system_prompt(&options);
        let schema = PromptEngine::output_schema();

        log::info!(
            "Requesting composition ({:?} mode, {} byte system prompt)",
            options.compose_mode,
            system_prompt.len()
        );
        let raw = provider.generate(&system_prompt, prompt, &schema)?;

        let mut manifest = Manifest::from_json(&raw)?;
        if let Some(hook) = &self.manifest_hook {
            manifest = hook(manifest, prompt, &options);
        }

        let Compilation { tree, grammar } = self.compiler().compile_all(&manifest)?;
        log::info!(
            "Composed {} top-level block(s), {} node(s) in total",
            tree.len(),
            crate::node::count_nodes(&tree)
        );

        Ok(Composition {
            grammar,
            block_tree: tree,
            summary: manifest.summary.clone(),
            manifest,
        })
    }
}
