use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = r#"
site_name = "Acme"

[[blocks]]
name = "core/paragraph"
title = "Paragraph"
attributes = ["content"]

[[blocks]]
name = "core/group"
supports_inner_blocks = true
"#;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, CONFIG).unwrap();
        Self { dir, config }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_block-composer"))
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env("RUST_LOG", "off")
            .output()
            .unwrap()
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const SECTION_MANIFEST: &str = r#"{
  "blocks": [
    {"blockType": "pattern", "attributes": [], "patternSlug": "ai-composer/section", "innerBlocks": []},
    {"blockType": "core/paragraph", "attributes": [{"name": "content", "value": "Hello"}], "patternSlug": null, "innerBlocks": []}
  ],
  "summary": "One section."
}"#;

#[test]
fn compile_prints_block_markup() {
    let workspace = Workspace::new();
    let manifest = workspace.write("manifest.json", SECTION_MANIFEST);

    let output = workspace.run(&["compile", arg(&manifest)]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim_end(),
        r#"<!-- wp:group {"align":"wide","layout":{"type":"constrained"},"className":"ai-composer-section"} -->
<!-- wp:group {"className":"ai-composer-slot"} -->
<!-- wp:paragraph {"content":"Hello"} /-->
<!-- /wp:group -->
<!-- /wp:group -->"#
    );
}

#[test]
fn compile_tree_format_prints_json() {
    let workspace = Workspace::new();
    let manifest = workspace.write("manifest.json", SECTION_MANIFEST);

    let output = workspace.run(&["compile", arg(&manifest), "--format", "tree"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let tree: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(tree[0]["name"], "core/group");
    assert_eq!(tree[0]["innerBlocks"][0]["innerBlocks"][0]["name"], "core/paragraph");
}

#[test]
fn validate_reports_violations_and_fails() {
    let workspace = Workspace::new();
    let manifest = workspace.write(
        "manifest.json",
        r#"{"blocks": [{"blockType": "core/quote", "attributes": [], "patternSlug": null, "innerBlocks": []}], "summary": ""}"#,
    );

    let output = workspace.run(&["validate", arg(&manifest)]);

    assert!(!output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("ai_composer_validation_failed"), "stderr: {stderr}");
    assert!(stderr.contains("blocks[0] uses unknown block type \"core/quote\"."));
}

#[test]
fn compose_replays_recorded_response() {
    let workspace = Workspace::new();
    let response = workspace.write("response.json", SECTION_MANIFEST);

    let output = workspace.run(&["compose", "A greeting", "--response", arg(&response)]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["summary"], "One section.");
    assert!(result["blocks"].as_str().unwrap().contains("wp:paragraph"));
}

#[test]
fn schema_needs_no_config() {
    let output = Command::new(env!("CARGO_BIN_EXE_block-composer"))
        .arg("schema")
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(schema["required"], serde_json::json!(["blocks", "summary"]));
}

#[test]
fn prompt_names_the_site() {
    let workspace = Workspace::new();
    let output = workspace.run(&["prompt"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let prompt = stdout(&output);
    assert!(prompt.contains("Acme"));
    assert!(prompt.contains("- **core/paragraph** (Paragraph) - attrs: content"));
}
