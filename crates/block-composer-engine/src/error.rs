use std::fmt;

use crate::composer::ProviderError;
use crate::grammar::GrammarError;

/// A single policy or structural problem found while validating a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location in the manifest, e.g. `blocks[0].innerBlocks[2]`.
    pub path: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    NotAnObject,
    MissingBlockType,
    MissingPatternSlug,
    InnerBlocksNotArray,
    UnknownPattern { slug: String },
    UnknownBlock { name: String },
    DisallowedBlock { name: String },
    /// A block inside an expanded pattern is not registered.
    PatternUnknownBlock { name: String },
    /// A block inside an expanded pattern is not on the allow-list.
    PatternDisallowedBlock { name: String },
    TooDeep { max_depth: usize },
    FieldTooLarge { max_length: usize },
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.kind {
            ViolationKind::NotAnObject => write!(f, "{path} must be an object."),
            ViolationKind::MissingBlockType => write!(f, "{path}.blockType is required."),
            ViolationKind::MissingPatternSlug => write!(
                f,
                "{path}.patternSlug is required when blockType is \"pattern\"."
            ),
            ViolationKind::InnerBlocksNotArray => write!(f, "{path}.innerBlocks must be an array."),
            ViolationKind::UnknownPattern { slug } => {
                write!(f, "{path} references unknown pattern \"{slug}\".")
            }
            ViolationKind::UnknownBlock { name } => {
                write!(f, "{path} uses unknown block type \"{name}\".")
            }
            ViolationKind::DisallowedBlock { name } => {
                write!(f, "{path} uses disallowed block type \"{name}\".")
            }
            ViolationKind::PatternUnknownBlock { name } => {
                write!(f, "{path} contains unknown block \"{name}\".")
            }
            ViolationKind::PatternDisallowedBlock { name } => {
                write!(f, "{path} contains disallowed block \"{name}\".")
            }
            ViolationKind::TooDeep { max_depth } => {
                write!(f, "{path} exceeds the maximum nesting depth of {max_depth}.")
            }
            ViolationKind::FieldTooLarge { max_length } => write!(
                f,
                "{path}.attributes contains a value longer than {max_length} bytes."
            ),
        }
    }
}

/// Failures while expanding a pattern reference into nodes.
#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    #[error("Pattern slug is missing.")]
    PatternSlugMissing,
    #[error("Pattern \"{0}\" not found.")]
    PatternNotFound(String),
    #[error("Pattern \"{slug}\" could not be parsed: {source}")]
    PatternParse {
        slug: String,
        #[source]
        source: GrammarError,
    },
}

/// The typed failure of a composition or compilation request.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("The AI returned an invalid composition manifest: {0}")]
    InvalidManifest(String),
    #[error("Manifest contains no blocks.")]
    EmptyManifest,
    #[error("{message}")]
    ValidationFailed {
        message: String,
        violations: Vec<Violation>,
    },
    #[error(transparent)]
    Expansion(#[from] ExpansionError),
    #[error("No AI provider is configured.")]
    NoProvider,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ComposeError {
    /// Aggregates violations into a single error. The message joins every
    /// violation so it can be shown verbatim.
    pub fn validation(violations: Vec<Violation>) -> Self {
        let message = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        ComposeError::ValidationFailed {
            message,
            violations,
        }
    }

    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            ComposeError::InvalidManifest(_) => "ai_composer_invalid_manifest",
            ComposeError::EmptyManifest => "ai_composer_empty_manifest",
            ComposeError::ValidationFailed { .. } => "ai_composer_validation_failed",
            ComposeError::Expansion(ExpansionError::PatternSlugMissing) => {
                "ai_composer_pattern_missing"
            }
            ComposeError::Expansion(ExpansionError::PatternNotFound(_)) => {
                "ai_composer_pattern_not_found"
            }
            ComposeError::Expansion(ExpansionError::PatternParse { .. }) => {
                "ai_composer_pattern_parse_failed"
            }
            ComposeError::NoProvider => "ai_composer_no_provider",
            ComposeError::Provider(_) => "ai_composer_provider_failed",
        }
    }

    /// Violations behind a failed validation; empty for every other error.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ComposeError::ValidationFailed { violations, .. } => violations,
            _ => &[],
        }
    }
}
