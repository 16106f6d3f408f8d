//! Rule validation and mutation engine.
//!
//! [`validate`] walks the document once per catalog rule and returns violations in a stable
//! order; [`fix`] consumes them in that order through the rule's fix handler. Checks and
//! handlers are bound to rule ids by the table in [`registry`].

pub mod checks;
pub mod fixer;
pub mod handlers;
pub mod registry;
pub mod validator;
pub mod violation;

pub use fixer::{fix, validate_and_fix, FixReport, FixResult};
pub use handlers::{Applied, Skip};
pub use registry::{lookup, suggest, unknown_rules, RuleHandler, UnknownRule, HANDLERS};
pub use validator::validate;
pub use violation::{Target, Violation};
