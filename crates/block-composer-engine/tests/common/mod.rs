// Helpers shared by the integration test binaries. Each binary uses a
// different subset, which dead code analysis cannot see.
#![allow(dead_code)]

use block_composer_engine::{BlockCatalog, BlockType, PatternLibrary, StaticSettings};

pub struct Site {
    pub blocks: BlockCatalog,
    pub patterns: PatternLibrary,
    pub settings: StaticSettings,
}

/// A site with the usual core blocks and the built-in section patterns.
pub fn site() -> Site {
    let blocks = BlockCatalog::new([
        BlockType::new("core/paragraph"),
        BlockType::new("core/heading"),
        BlockType::new("core/image"),
        BlockType::new("core/separator"),
        BlockType::container("core/group"),
        BlockType::container("core/columns"),
        BlockType {
            parent: vec!["core/columns".into()],
            ..BlockType::container("core/column")
        },
        BlockType::container("core/buttons"),
        BlockType {
            parent: vec!["core/buttons".into()],
            ..BlockType::new("core/button")
        },
        BlockType::new("core/html"),
    ]);
    let patterns = PatternLibrary::with_builtins([], &blocks);

    Site {
        blocks,
        patterns,
        settings: StaticSettings::default(),
    }
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}
