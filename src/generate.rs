//! Rule catalog generation through the text generation service.
//!
//! The service is prompted with the bundled base rules and the caller's API document, and must
//! reply with a complete `rules:` YAML catalog. Replies that do not parse or validate as a
//! catalog are rejected.

use crate::backfill::{BackfillError, ChatMessage, TextGenerator};
use crate::catalog::{self, CatalogError, RuleCatalog, BASE_RULES_YAML};
use crate::document::{self, DocumentError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_COMPLIANCE: &str = "GDPR, SOC2";
pub const GENERATED_RULES_PATH: &str = "rules/generated_rules.yaml";

const GOVERNANCE_INSTRUCTIONS: &str = "\
You are an API governance AI agent. Generate a single YAML file from the provided OpenAPI \
specification and compliance requirements. Reply with the YAML file only: a top-level `rules` \
array and no additional text or explanations.

Cover security, compliance, performance, consistency and documentation. Rules must check \
standard OpenAPI fields only.

1. Industry inference: infer the industry from the endpoints, data types and structure of the \
specification.
2. Rule generation: apply the base rules below and add industry-specific rules that satisfy the \
requested compliance standards.
3. Rule format: every rule has `id` (unique), `description`, `conditions` (a list of conditions \
on the specification) and `fix` (a `description` and a `fix_snippet`).";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("rule generation request failed: {0}")]
    Request(#[from] BackfillError),

    #[error("generated rules were rejected: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Write(#[from] DocumentError),
}

/// A validated catalog and the YAML text it was parsed from.
#[derive(Debug, Clone)]
pub struct GeneratedRules {
    pub catalog: RuleCatalog,
    pub yaml: String,
}

pub fn system_prompt() -> String {
    format!("{GOVERNANCE_INSTRUCTIONS}\n\nBase rules:\n```yaml\n{BASE_RULES_YAML}```\n")
}

pub fn user_message(compliance: &str, spec_text: &str) -> String {
    format!("I require the {compliance} compliance standards. Here's my API spec:\n{spec_text}\n")
}

/// Strip a surrounding ``` fence (with or without a language tag) from a reply.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => "",
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

pub fn generate_rules(
    generator: &dyn TextGenerator,
    compliance: &str,
    spec_text: &str,
) -> Result<GeneratedRules, GenerateError> {
    let messages = [
        ChatMessage::system(system_prompt()),
        ChatMessage::user(user_message(compliance, spec_text)),
    ];
    let reply = generator.complete(&messages)?;
    let yaml = format!("{}\n", strip_code_fence(&reply));
    let catalog = catalog::load_from_str(&yaml)?;
    info!(rules = catalog.rules.len(), compliance, "generated rule catalog");
    Ok(GeneratedRules { catalog, yaml })
}

/// Write generated rules atomically, creating the parent directory when needed.
pub fn write_rules(path: &Path, rules: &GeneratedRules) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| GenerateError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    document::write_atomic(path, &rules.yaml)?;
    Ok(())
}
