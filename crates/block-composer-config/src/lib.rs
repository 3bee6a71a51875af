use block_composer_engine::registry::patterns::PATTERN_NAMESPACE;
use block_composer_engine::{
    BlockCatalog, BlockType, CompilerOptions, Pattern, PatternLibrary, StaticSettings,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read pattern file at {pattern_path}: {source}")]
    PatternReadError {
        pattern_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse pattern file at {pattern_path}: {source}")]
    PatternParseError {
        pattern_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid pattern directory glob {glob}: {source}")]
    PatternGlobError {
        glob: String,
        source: glob::PatternError,
    },
}

/// Site configuration: administrator settings, the registered block types
/// and where to find extra patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Blocks the model may use. Empty allows every registered block.
    pub enabled_blocks: Vec<String>,
    pub system_prompt_prepend: String,
    pub system_prompt_append: String,
    pub theme_strategy: bool,
    /// Directory of `*.toml` and `*.html` pattern files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns_path: Option<PathBuf>,
    pub compiler: CompilerOptions,
    pub blocks: Vec<BlockType>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // patterns_path may use ~ or $VARS; keep it verbatim if expansion fails
        config.patterns_path = config
            .patterns_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/block-composer");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    pub fn settings(&self) -> StaticSettings {
        StaticSettings {
            site_name: self.site_name.clone(),
            enabled_blocks: self.enabled_blocks.clone(),
            system_prompt_prepend: self.system_prompt_prepend.clone(),
            system_prompt_append: self.system_prompt_append.clone(),
            theme_strategy: self.theme_strategy,
        }
    }

    pub fn block_catalog(&self) -> BlockCatalog {
        BlockCatalog::new(self.blocks.iter().cloned())
    }

    pub fn compiler_options(&self) -> CompilerOptions {
        self.compiler.clone()
    }

    /// Patterns from the configured directory plus the built-in scaffolds.
    pub fn pattern_library(&self) -> Result<PatternLibrary, ConfigError> {
        let patterns = match &self.patterns_path {
            Some(dir) => load_patterns(dir)?,
            None => Vec::new(),
        };
        Ok(PatternLibrary::with_builtins(patterns, &self.block_catalog()))
    }
}

/// Loads every `*.toml` and `*.html` pattern in `dir`, sorted by path.
///
/// TOML files hold a full pattern definition; a missing `name` defaults to
/// `ai-composer/<file-stem>`. HTML files are bare markup named after their
/// stem. Patterns without content are skipped.
pub fn load_patterns(dir: &Path) -> Result<Vec<Pattern>, ConfigError> {
    let mut paths = Vec::new();
    for extension in ["toml", "html"] {
        let glob = dir.join(format!("*.{extension}")).to_string_lossy().into_owned();
        let entries = glob::glob(&glob).map_err(|source| ConfigError::PatternGlobError {
            glob: glob.clone(),
            source,
        })?;
        for entry in entries {
            let path = entry.map_err(|e| ConfigError::PatternReadError {
                pattern_path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            paths.push(path);
        }
    }
    paths.sort();

    let mut patterns = Vec::new();
    for path in paths {
        let Some(pattern) = load_pattern_file(&path)? else {
            continue;
        };
        if pattern.content.trim().is_empty() {
            log::warn!("Skipping pattern {} from {}: no content", pattern.name, path.display());
            continue;
        }
        log::debug!("Loaded pattern {} from {}", pattern.name, path.display());
        patterns.push(pattern);
    }
    Ok(patterns)
}

fn load_pattern_file(path: &Path) -> Result<Option<Pattern>, ConfigError> {
    let Some(slug) = path
        .file_stem()
        .map(|stem| slug_from_stem(&stem.to_string_lossy()))
        .filter(|slug| !slug.is_empty())
    else {
        log::warn!("Skipping pattern file with unusable name: {}", path.display());
        return Ok(None);
    };

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::PatternReadError {
        pattern_path: path.to_path_buf(),
        source,
    })?;

    let mut pattern = if path.extension().is_some_and(|ext| ext == "toml") {
        let defined: Pattern =
            toml::from_str(&content).map_err(|source| ConfigError::PatternParseError {
                pattern_path: path.to_path_buf(),
                source,
            })?;
        merge_defaults(defined, &slug)
    } else {
        Pattern::from_slug(&slug, content)
    };
    pattern.source = "file".to_string();

    Ok(Some(pattern))
}

/// Fills unset fields of a file-defined pattern from its file name.
fn merge_defaults(defined: Pattern, slug: &str) -> Pattern {
    let defaults = Pattern::from_slug(slug, String::new());
    Pattern {
        name: if defined.name.trim().is_empty() {
            defaults.name
        } else {
            defined.name
        },
        title: if defined.title.is_empty() {
            defaults.title
        } else {
            defined.title
        },
        categories: if defined.categories.is_empty() {
            defaults.categories
        } else {
            defined.categories
        },
        ..defined
    }
}

/// Lowercases a file stem and collapses anything but letters, digits and
/// `_` into single hyphens.
fn slug_from_stem(stem: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    for c in stem.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Name a pattern file would be registered under.
pub fn pattern_name_for(stem: &str) -> String {
    format!("{PATTERN_NAMESPACE}/{}", slug_from_stem(stem))
}
