//! # Registry Adapters
//!
//! Read-only views of the site the pipeline compiles against. The compiler
//! only ever sees these traits, so tests can swap in small fakes and the
//! in-memory catalogs here can be filled from any source (the config crate
//! loads them from TOML).
//!
//! - **`blocks`**: [`BlockType`] and the in-memory [`BlockCatalog`]
//! - **`patterns`**: [`Pattern`] and the in-memory [`PatternLibrary`] with
//!   built-in section scaffolds
//! - **`settings`**: [`StaticSettings`], a plain [`SettingsStore`]

pub mod blocks;
pub mod patterns;
pub mod settings;

use std::collections::HashSet;

pub use blocks::{BlockCatalog, BlockType};
pub use patterns::{Pattern, PatternLibrary};
pub use settings::StaticSettings;

/// Lookup of registered block types.
pub trait BlockRegistry {
    fn block_exists(&self, name: &str) -> bool;

    /// Whether the block accepts nested content.
    fn supports_inner_blocks(&self, name: &str) -> bool;

    /// Every registered block type, for catalog listings.
    fn block_types(&self) -> Vec<&BlockType>;
}

/// Lookup of registered patterns.
pub trait PatternCatalog {
    fn get_pattern(&self, slug: &str) -> Option<&Pattern>;

    /// Every pattern, for catalog listings.
    fn patterns(&self) -> Vec<&Pattern>;

    fn pattern_exists(&self, slug: &str) -> bool {
        self.get_pattern(slug).is_some()
    }

    fn pattern_content(&self, slug: &str) -> Option<&str> {
        self.get_pattern(slug).map(|p| p.content.as_str())
    }
}

/// Administrator settings consulted by the pipeline.
pub trait SettingsStore {
    /// Block names the model may use. Empty means every block is allowed.
    fn enabled_blocks(&self) -> Vec<String>;

    fn site_name(&self) -> Option<String> {
        None
    }

    fn system_prompt_prepend(&self) -> String {
        String::new()
    }

    fn system_prompt_append(&self) -> String {
        String::new()
    }

    fn theme_strategy_enabled(&self) -> bool {
        false
    }
}

/// Snapshot of the allow-list taken once per compile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    /// An empty allow-list: every block is allowed.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.is_empty())
                .collect(),
        }
    }

    pub fn from_settings(settings: &dyn SettingsStore) -> Self {
        Self::from_names(settings.enabled_blocks())
    }

    pub fn allows_all(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allows_all() || self.names.contains(name)
    }
}
