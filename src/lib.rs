//! Cartlis: API governance linter and fixer for OpenAPI documents
//!
//! Documents are checked against a catalog of governance rules (security, rate limiting,
//! naming, versioning, documentation completeness) and can be rewritten so the violations
//! go away.
//!
//! # Architecture
//!
//! Rules are data ([`RuleCatalog`]); what a rule checks and how it is fixed is bound to its id
//! by a fixed dispatch table ([`engine::registry`]). The [`validate`] pass produces an ordered
//! list of [`Violation`]s and the [`fix`] pass consumes them in that order, editing a typed
//! [`Document`] tree.
//!
//! # Guarantees
//!
//! - Validation is pure and deterministic
//! - A fix handler whose target disappeared is skipped, never fatal
//! - Moving a path re-points every pending violation that referred to it
//! - Explicitly null responses are repaired before and after the fix pass
//! - Free-text backfill always yields usable text, degrading to a fixed placeholder
//! - Output files are written atomically (tempfile + fsync + rename)
//!
//! # Example
//!
//! ```no_run
//! use cartlis::{catalog, document, fix, validate, Backfill};
//!
//! let rules = catalog::load_from_path("rules/base_rules.yaml")?;
//! let mut loaded = document::load_from_path("api_spec.yaml")?;
//!
//! let mut violations = validate(&loaded.document, &rules);
//! for violation in &violations {
//!     println!("{violation}");
//! }
//!
//! let report = fix(&mut loaded.document, &mut violations, &Backfill::disabled());
//! println!("{} fixes applied", report.applied());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backfill;
pub mod catalog;
pub mod document;
pub mod engine;
pub mod generate;
pub mod naming;
pub mod settings;

// Re-exports
pub use backfill::{Backfill, BackfillError, ChatClient, ChatMessage, Generated, TextGenerator};
pub use catalog::{CatalogError, FixTemplate, Rule, RuleCatalog};
pub use document::{Document, DocumentError, Format, LoadedDocument};
pub use engine::{fix, validate, validate_and_fix, FixReport, FixResult, Target, Violation};
pub use generate::{generate_rules, GenerateError, GeneratedRules};
pub use naming::{to_camel_case, to_snake_case};
pub use settings::{BackfillSettings, Settings, SettingsError};
