//! Mutation engine: applies fix handlers to a document in violation order.
//!
//! The pass runs in three phases:
//! - null responses are replaced with a described placeholder,
//! - each violation is dispatched to its rule's handler, re-pointing pending violations when a
//!   handler moves a path,
//! - null responses are swept once more.

use super::registry;
use super::handlers::Applied;
use super::validator::validate;
use super::violation::Violation;
use crate::backfill::Backfill;
use crate::catalog::RuleCatalog;
use crate::document::Document;
use std::fmt;
use tracing::{debug, info};

/// Result of dispatching one violation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FixResult should be checked for skips and fallbacks"]
pub enum FixResult {
    /// The handler edited the document; `fallbacks` counts degraded backfills.
    Applied { fallbacks: usize },
    /// The handler moved a path and re-pointed `repointed` pending violations.
    Moved {
        from: String,
        to: String,
        repointed: usize,
    },
    /// The handler's target was gone or unsuitable.
    Skipped { reason: String },
    /// The rule has no fix handler (report-only or unknown id).
    NoHandler,
}

impl FixResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, FixResult::Applied { .. } | FixResult::Moved { .. })
    }

    pub fn fallbacks(&self) -> usize {
        match self {
            FixResult::Applied { fallbacks } => *fallbacks,
            _ => 0,
        }
    }
}

impl fmt::Display for FixResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixResult::Applied { fallbacks: 0 } => write!(f, "applied"),
            FixResult::Applied { fallbacks } => {
                write!(f, "applied ({fallbacks} fallback text(s))")
            }
            FixResult::Moved {
                from,
                to,
                repointed,
            } => write!(f, "moved {from} -> {to} ({repointed} pending re-pointed)"),
            FixResult::Skipped { reason } => write!(f, "skipped: {reason}"),
            FixResult::NoHandler => write!(f, "no fix available"),
        }
    }
}

/// Per-violation outcomes of one fix pass, in dispatch order.
#[derive(Debug, Clone, Default)]
pub struct FixReport {
    /// Null responses replaced by the sanitation sweeps.
    pub sanitized: usize,
    /// Each violation as it stood when dispatched, with its outcome.
    pub results: Vec<(Violation, FixResult)>,
}

impl FixReport {
    pub fn applied(&self) -> usize {
        self.count(FixResult::is_applied)
    }

    pub fn skipped(&self) -> usize {
        self.count(|result| matches!(result, FixResult::Skipped { .. }))
    }

    pub fn unfixable(&self) -> usize {
        self.count(|result| matches!(result, FixResult::NoHandler))
    }

    /// Backfilled texts that degraded to the fallback placeholder.
    pub fn degraded(&self) -> usize {
        self.results.iter().map(|(_, result)| result.fallbacks()).sum()
    }

    fn count(&self, predicate: impl Fn(&FixResult) -> bool) -> usize {
        self.results
            .iter()
            .filter(|(_, result)| predicate(result))
            .count()
    }
}

/// Apply fixes for `violations` in order.
///
/// When a handler moves a path, every later violation that still refers to the old key is
/// rewritten in place to the new key before it is dispatched.
pub fn fix(document: &mut Document, violations: &mut [Violation], backfill: &Backfill) -> FixReport {
    let mut report = FixReport {
        sanitized: document.sanitize_null_responses(),
        results: Vec::with_capacity(violations.len()),
    };

    for idx in 0..violations.len() {
        let result = dispatch(document, &violations[idx], backfill);
        let result = match result {
            DispatchOutcome::Moved { from, to } => {
                let repointed = repoint_pending(&mut violations[idx + 1..], &from, &to);
                FixResult::Moved {
                    from,
                    to,
                    repointed,
                }
            }
            DispatchOutcome::Done(result) => result,
        };
        report.results.push((violations[idx].clone(), result));
    }

    report.sanitized += document.sanitize_null_responses();
    info!(
        applied = report.applied(),
        skipped = report.skipped(),
        unfixable = report.unfixable(),
        degraded = report.degraded(),
        sanitized = report.sanitized,
        "fix pass complete"
    );
    report
}

/// Validate the document against the catalog and fix everything found.
pub fn validate_and_fix(
    document: &mut Document,
    catalog: &RuleCatalog,
    backfill: &Backfill,
) -> FixReport {
    let mut violations = validate(document, catalog);
    fix(document, &mut violations, backfill)
}

enum DispatchOutcome {
    Moved { from: String, to: String },
    Done(FixResult),
}

fn dispatch(document: &mut Document, violation: &Violation, backfill: &Backfill) -> DispatchOutcome {
    let Some(fix) = registry::lookup(&violation.rule_id).and_then(|handler| handler.fix) else {
        debug!(rule = %violation.rule_id, target = %violation.target, "no fix handler");
        return DispatchOutcome::Done(FixResult::NoHandler);
    };
    match fix(document, violation, backfill) {
        Ok(Applied::Edited { fallbacks }) => {
            debug!(rule = %violation.rule_id, target = %violation.target, "applied fix");
            DispatchOutcome::Done(FixResult::Applied { fallbacks })
        }
        Ok(Applied::Moved { from, to }) => {
            debug!(rule = %violation.rule_id, %from, %to, "moved path");
            DispatchOutcome::Moved { from, to }
        }
        Err(skip) => {
            debug!(rule = %violation.rule_id, reason = %skip.reason, "skipped fix");
            DispatchOutcome::Done(FixResult::Skipped {
                reason: skip.reason,
            })
        }
    }
}

fn repoint_pending(pending: &mut [Violation], from: &str, to: &str) -> usize {
    pending
        .iter_mut()
        .map(|violation| violation.repoint(from, to))
        .filter(|&changed| changed)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Rule;
    use crate::engine::violation::Target;

    #[test]
    fn move_repoints_only_later_violations() {
        let mut document: Document =
            serde_yaml::from_str("paths:\n  /pets:\n    get:\n      responses:\n        '200':\n")
                .unwrap();
        let rule = |id: &str| Rule::new(id, id);
        let mut violations = vec![
            Violation::new(&rule("DOC001"), Target::operation("/pets", "get")),
            Violation::new(&rule("VER001"), Target::path_entry("/pets")),
            Violation::new(&rule("RESP001"), Target::operation("/pets", "get")),
            Violation::new(&rule("SERVER001"), Target::Document),
        ];

        let report = fix(&mut document, &mut violations, &Backfill::disabled());

        assert_eq!(violations[0].path(), Some("/pets"));
        assert_eq!(violations[2].path(), Some("/v1/pets"));
        assert_eq!(
            report.results[1].1,
            FixResult::Moved {
                from: "/pets".to_string(),
                to: "/v1/pets".to_string(),
                repointed: 1
            }
        );
        assert!(report.results[2].1.is_applied());
        assert_eq!(report.results[3].1, FixResult::NoHandler);
        assert_eq!(report.sanitized, 1);
        assert_eq!(report.degraded(), 1);

        let op = document.operation("/v1/pets", "get").unwrap();
        assert!(op.response("200").unwrap().has_content());
    }
}
