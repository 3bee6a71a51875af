//! Command-line front end for the block composer.
//!
//! Usage:
//!   block-composer compile `<manifest>` [--format grammar|tree]   - Compile a manifest file (or `-` for stdin)
//!   block-composer validate `<manifest>`                          - Report policy violations
//!   block-composer prompt [--template `<name>`] [--mode `<mode>`]  - Print the system prompt
//!   block-composer schema                                       - Print the strict output schema
//!   block-composer catalog                                      - List composable blocks and patterns
//!   block-composer compose `<prompt>` --response `<file>`         - Run the full pipeline on a recorded response

mod replay;

use anyhow::{Context, Result};
use block_composer_config::Config;
use block_composer_engine::registry::{blocks, patterns};
use block_composer_engine::{
    AllowList, BlockCatalog, ComposeError, ComposeMode, ComposeOptions, Composer, InsertMode,
    Manifest, ManifestCompiler, PatternLibrary, PromptEngine, StaticSettings,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use replay::ReplayProvider;

#[derive(Parser)]
#[command(name = "block-composer", version, about = "Compile AI page manifests into block markup")]
struct Cli {
    /// Config file to use instead of ~/.config/block-composer/config.toml
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a manifest into block markup or a block tree
    Compile {
        /// Manifest JSON file, or `-` for stdin
        manifest: String,
        #[arg(long, short = 'f', value_enum, default_value_t = Format::Grammar)]
        format: Format,
    },
    /// Validate a manifest and list every violation
    Validate {
        /// Manifest JSON file, or `-` for stdin
        manifest: String,
    },
    /// Print the system prompt sent to the model
    Prompt {
        #[arg(long)]
        template: Option<String>,
        #[arg(long, default_value = "new_content")]
        mode: ComposeMode,
    },
    /// Print the strict JSON schema the model must answer with
    Schema,
    /// List the composable blocks and available patterns
    Catalog,
    /// Compose a page from a prompt, replaying a recorded model response
    Compose {
        prompt: String,
        /// Recorded model response, or `-` for stdin
        #[arg(long, short = 'r')]
        response: String,
        #[arg(long)]
        template: Option<String>,
        #[arg(long, default_value = "new_content")]
        mode: ComposeMode,
        #[arg(long, default_value = "append")]
        insert_mode: InsertMode,
        /// JSON file describing the selected block
        #[arg(long)]
        selected_block_context: Option<PathBuf>,
        /// JSON file describing the current page
        #[arg(long)]
        page_context: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Serialized block markup
    Grammar,
    /// The block tree as JSON
    Tree,
}

/// Registries built from the loaded config.
struct Site {
    config: Config,
    blocks: BlockCatalog,
    patterns: PatternLibrary,
    settings: StaticSettings,
}

impl Site {
    fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::config_path);
        log::info!("Config path: {}", config_path.display());

        let config = match Config::load_from_path(&config_path)? {
            Some(config) => config,
            None => {
                log::warn!(
                    "No config file at {}, using an empty site",
                    config_path.display()
                );
                Config::default()
            }
        };

        let patterns = config.pattern_library()?;
        log::info!(
            "Loaded {} block types and {} patterns",
            config.blocks.len(),
            patterns.len()
        );

        Ok(Self {
            blocks: config.block_catalog(),
            settings: config.settings(),
            patterns,
            config,
        })
    }

    fn compiler(&self) -> ManifestCompiler<'_> {
        ManifestCompiler::new(&self.blocks, &self.patterns, &self.settings)
            .with_options(self.config.compiler_options())
    }

    fn composer(&self) -> Composer<'_> {
        Composer::new(&self.blocks, &self.patterns, &self.settings)
            .with_options(self.config.compiler_options())
    }

    fn prompt_engine(&self) -> PromptEngine<'_> {
        self.composer().prompt_engine()
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        if let Some(compose_error) = e.downcast_ref::<ComposeError>() {
            eprintln!("Error [{}]: {compose_error}", compose_error.code());
            for violation in compose_error.violations() {
                eprintln!("  - {violation}");
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&PromptEngine::output_schema())?);
            Ok(())
        }
        Command::Compile { manifest, format } => {
            handle_compile(&Site::load(config_path)?, &manifest, format)
        }
        Command::Validate { manifest } => handle_validate(&Site::load(config_path)?, &manifest),
        Command::Prompt { template, mode } => {
            let options = ComposeOptions {
                template,
                compose_mode: mode,
                ..ComposeOptions::default()
            };
            let site = Site::load(config_path)?;
            println!("{}", site.prompt_engine().system_prompt(&options));
            Ok(())
        }
        Command::Catalog => {
            handle_catalog(&Site::load(config_path)?);
            Ok(())
        }
        Command::Compose {
            prompt,
            response,
            template,
            mode,
            insert_mode,
            selected_block_context,
            page_context,
        } => {
            let options = ComposeOptions {
                template,
                compose_mode: mode,
                insert_mode,
                selected_block_context: read_context(selected_block_context.as_deref())?,
                page_context: read_context(page_context.as_deref())?,
            };
            handle_compose(&Site::load(config_path)?, &prompt, &response, &options)
        }
    }
}

fn handle_compile(site: &Site, manifest_path: &str, format: Format) -> Result<()> {
    let manifest = Manifest::from_json(&read_input(manifest_path)?)?;
    let compilation = site.compiler().compile_all(&manifest)?;

    match format {
        Format::Grammar => println!("{}", compilation.grammar),
        Format::Tree => println!("{}", serde_json::to_string_pretty(&compilation.tree)?),
    }
    Ok(())
}

fn handle_validate(site: &Site, manifest_path: &str) -> Result<()> {
    let manifest = Manifest::from_json(&read_input(manifest_path)?)?;
    site.compiler().validate(&manifest)?;
    println!("Manifest is valid ({} top-level entries)", manifest.blocks.len());
    Ok(())
}

fn handle_catalog(site: &Site) {
    let allow = AllowList::from_settings(&site.settings);
    let block_text = blocks::to_prompt_text(&site.blocks, &allow);
    let pattern_text = patterns::to_prompt_text(&site.patterns);

    if block_text.is_empty() && pattern_text.is_empty() {
        println!("No composable blocks or patterns are registered.");
        return;
    }
    for text in [block_text, pattern_text] {
        if !text.is_empty() {
            println!("{text}\n");
        }
    }
}

fn handle_compose(site: &Site, prompt: &str, response_path: &str, options: &ComposeOptions) -> Result<()> {
    let provider = ReplayProvider::new(read_input(response_path)?);
    let composition = site.composer().with_provider(&provider).compose(prompt, options)?;
    println!("{}", serde_json::to_string_pretty(&composition.to_value())?);
    Ok(())
}

/// Reads a file, or stdin when `path` is `-`.
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
}

fn read_context(path: Option<&Path>) -> Result<Option<Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Context file {} is not valid JSON", path.display()))?;
    Ok(Some(value))
}
