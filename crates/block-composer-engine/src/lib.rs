//! # block-composer-engine
//!
//! Turns an AI-proposed page *manifest* into a validated tree of concrete
//! block nodes.
//!
//! ## Pipeline
//!
//! ```text
//! raw model text → Manifest::from_json → coalesce → validate → build → serialize
//!                  (manifest)            (compiler::coalesce) (compiler::validate)
//!                                                   (compiler::build + compiler::inject)
//!                                                                       (grammar::serialize)
//! ```
//!
//! - **`manifest`**: decoded model output; every entry is decided once into a
//!   [`Definition`] variant (block, pattern or invalid)
//! - **`attributes`**: name/value pair normalization and string casting
//! - **`registry`**: read-only adapters for blocks, patterns and settings
//! - **`compiler`**: [`ManifestCompiler`] running the whole pass
//! - **`grammar`**: the comment-delimited block markup (parse + serialize)
//! - **`prompt`**: system prompt and strict output schema for the provider
//! - **`composer`**: end-to-end orchestration around a [`Provider`]

pub mod attributes;
pub mod compiler;
pub mod composer;
pub mod error;
pub mod grammar;
pub mod manifest;
pub mod node;
pub mod prompt;
pub mod registry;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use compiler::{Compilation, CompilerOptions, Hooks, ManifestCompiler};
pub use composer::{
    ComposeMode, ComposeOptions, Composer, Composition, InsertMode, Provider, ProviderError,
};
pub use error::{ComposeError, ExpansionError, Violation, ViolationKind};
pub use grammar::{GrammarError, parse_blocks, serialize_blocks};
pub use manifest::{BlockDefinition, Definition, InvalidDefinition, Manifest, PatternDefinition};
pub use node::{Node, count_nodes};
pub use prompt::PromptEngine;
pub use registry::{
    AllowList, BlockCatalog, BlockRegistry, BlockType, Pattern, PatternCatalog, PatternLibrary,
    SettingsStore, StaticSettings,
};
