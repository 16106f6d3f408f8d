pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, CatalogError};
pub use schema::{FixTemplate, Rule, RuleCatalog, ValidationError, ValidationIssue};

/// The rule catalog shipped with the crate.
pub const BASE_RULES_YAML: &str = include_str!("../../rules/base_rules.yaml");
