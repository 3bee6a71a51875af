//! Shared fixtures for unit tests: a small site registry and manifest
//! definition builders.

use serde_json::{Value, json};
use std::cell::RefCell;

use crate::composer::{Provider, ProviderError};
use crate::manifest::Definition;
use crate::registry::{BlockCatalog, BlockRegistry, BlockType, PatternLibrary};

/// Core blocks commonly found on a site, plus one custom container.
pub fn fixture_blocks() -> BlockCatalog {
    BlockCatalog::new([
        BlockType::new("core/paragraph"),
        BlockType::new("core/heading"),
        BlockType::new("core/image"),
        BlockType::new("core/spacer"),
        BlockType::new("core/separator"),
        BlockType::container("core/group"),
        BlockType::container("core/columns"),
        BlockType {
            parent: vec!["core/columns".into()],
            ..BlockType::container("core/column")
        },
        BlockType::container("core/cover"),
        BlockType::new("core/html"),
        BlockType::container("acme/card"),
    ])
}

/// Built-in patterns for `blocks`.
pub fn fixture_patterns(blocks: &dyn BlockRegistry) -> PatternLibrary {
    PatternLibrary::with_builtins([], blocks)
}

pub fn paragraph(content: &str) -> Definition {
    Definition::block(
        "core/paragraph",
        json!([{"name": "content", "value": content}]),
        vec![],
    )
}

pub fn heading(level: u8, content: &str) -> Definition {
    Definition::block(
        "core/heading",
        json!([
            {"name": "level", "value": level.to_string()},
            {"name": "content", "value": content}
        ]),
        vec![],
    )
}

pub fn section(slug: &str, inner_blocks: Vec<Definition>) -> Definition {
    Definition::pattern(slug, inner_blocks)
}

/// Provider that replays canned responses and records every call as
/// `(system_prompt, user_prompt)`.
pub struct ScriptedProvider {
    response: Result<String, RefCell<Option<ProviderError>>>,
    available: bool,
    calls: RefCell<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            available: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new("")
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            response: Err(RefCell::new(Some(error))),
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.borrow().clone()
    }
}

impl Provider for ScriptedProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    fn generate(&self, system_prompt: &str, user_prompt: &str, _schema: &Value) -> Result<String, ProviderError> {
        self.calls
            .borrow_mut()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        match &self.response {
            Ok(raw) => Ok(raw.clone()),
            Err(error) => Err(error.borrow_mut().take().unwrap_or(ProviderError::EmptyResponse)),
        }
    }
}
