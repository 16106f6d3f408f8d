//! Integration tests for the command-line interface
//!
//! Every run gets an explicit settings file with backfill disabled, so no test reaches the
//! text generation service.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SPEC: &str = r#"openapi: 3.0.0
info:
  title: Payments
  version: 1.0.0
servers:
  - url: http://api.acme.io
paths:
  /transactions:
    post:
      description: Create a transaction.
      responses:
        '200':
          description: created
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let rules = Path::new(env!("CARGO_MANIFEST_DIR")).join("rules/base_rules.yaml");
        fs::write(
            dir.path().join("settings.toml"),
            format!(
                "[rules]\npath = {:?}\n\n[backfill]\nenabled = false\n",
                rules.display().to_string()
            ),
        )
        .unwrap();
        fs::write(dir.path().join("api_spec.yaml"), SPEC).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_cartlis"))
            .current_dir(self.dir.path())
            .arg("--config")
            .arg(self.path("settings.toml"))
            .args(args)
            .env_remove("CARTLIS_API_KEY")
            .env_remove("OPENAI_API_KEY")
            .env("NO_COLOR", "1")
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_exits_successfully() {
    let output = Command::new(env!("CARGO_BIN_EXE_cartlis"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("Lint OpenAPI documents"));
}

#[test]
fn missing_spec_argument_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_cartlis"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--spec"));
}

#[test]
fn missing_catalog_fails() {
    let ws = Workspace::new();
    let output = ws.run(&["--spec", "api_spec.yaml", "--rules", "nope.yaml"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nope.yaml"));
}

#[test]
fn missing_document_fails() {
    let ws = Workspace::new();
    let output = ws.run(&["--spec", "absent.yaml"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("absent.yaml"));
}

#[test]
fn report_without_fix_leaves_files_alone() {
    let ws = Workspace::new();
    let output = ws.run(&["--spec", "api_spec.yaml"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Violations:"));
    assert!(out.contains("SEC002"));
    assert!(out.contains("VER001"));
    assert!(out.contains("Run the command again with --fix to apply fixes."));
    assert!(!ws.path("fixed_api_spec.yaml").exists());
    assert_eq!(fs::read_to_string(ws.path("api_spec.yaml")).unwrap(), SPEC);
}

#[test]
fn fix_writes_sibling_document() {
    let ws = Workspace::new();
    let output = ws.run(&["--spec", "api_spec.yaml", "--fix"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Fixes:"));
    assert!(out.contains("Summary:"));
    assert!(out.contains("Fixed document written to"));

    let fixed = fs::read_to_string(ws.path("fixed_api_spec.yaml")).unwrap();
    assert!(fixed.contains("/v1/transactions"));
    assert!(fixed.contains("https://api.acme.io"));
    assert!(fixed.contains("X-RateLimit-Limit"));
    assert!(fixed.contains("operationId_placeholder_post"));
    assert_eq!(fs::read_to_string(ws.path("api_spec.yaml")).unwrap(), SPEC);
}

#[test]
fn fix_honours_output_path() {
    let ws = Workspace::new();
    let output = ws.run(&["--spec", "api_spec.yaml", "--fix", "-o", "clean.yaml"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(ws.path("clean.yaml").exists());
    assert!(!ws.path("fixed_api_spec.yaml").exists());
}

#[test]
fn json_report_is_machine_readable() {
    let ws = Workspace::new();
    let output = ws.run(&["--spec", "api_spec.yaml", "--fix", "--format", "json"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let violations = report["violations"].as_array().unwrap();
    assert!(violations
        .iter()
        .any(|v| v["id"] == "SEC002" && v["path"] == "/transactions" && v["method"] == "post"));
    assert!(violations.iter().any(|v| v["id"] == "SEC003" && v.get("path").is_none()));
    assert!(!report["fixes"].as_array().unwrap().is_empty());
    assert!(report["remaining"].is_array());
    assert!(report["output"]
        .as_str()
        .unwrap()
        .ends_with("fixed_api_spec.yaml"));
}

#[test]
fn diff_shows_changed_lines() {
    let ws = Workspace::new();
    let output = ws.run(&["--spec", "api_spec.yaml", "--fix", "--diff"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("(original)"));
    assert!(out.lines().any(|line| line.starts_with("-  /transactions:")));
    assert!(out.lines().any(|line| line.starts_with("+  /v1/transactions:")));
}

#[test]
fn json_documents_are_written_back_as_json() {
    let ws = Workspace::new();
    fs::write(
        ws.path("api.json"),
        r#"{"openapi":"3.0.0","paths":{"/v1/pets":{"get":{"responses":{"200":null}}}}}"#,
    )
    .unwrap();
    let output = ws.run(&["--spec", "api.json", "--fix"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let fixed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ws.path("fixed_api.json")).unwrap()).unwrap();
    assert!(fixed["paths"]["/v1/pets"]["get"]["responses"]["200"]["description"].is_string());
}

#[test]
fn clean_document_reports_no_violations() {
    let ws = Workspace::new();
    fs::write(
        ws.path("rules.yaml"),
        "rules:\n  - id: VER001\n    description: Version every path.\n",
    )
    .unwrap();
    fs::write(ws.path("clean.yaml"), "paths:\n  /v1/pets:\n    get: {}\n").unwrap();
    let output = ws.run(&["--spec", "clean.yaml", "--rules", "rules.yaml"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("No violations found."));
}
