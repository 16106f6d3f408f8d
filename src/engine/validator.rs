use super::registry;
use super::violation::Violation;
use crate::catalog::RuleCatalog;
use crate::document::Document;
use tracing::{debug, warn};

/// Run every catalog rule against the document.
///
/// Violations come out in catalog order, then document order. Rules without a built-in check
/// are skipped with a warning.
pub fn validate(document: &Document, catalog: &RuleCatalog) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rule in &catalog.rules {
        let Some(handler) = registry::lookup(&rule.id) else {
            match registry::suggest(&rule.id) {
                Some(known) => warn!(rule = %rule.id, "no built-in check for rule; did you mean {known}?"),
                None => warn!(rule = %rule.id, "no built-in check for rule; skipping"),
            }
            continue;
        };
        let before = violations.len();
        (handler.check)(document, rule, &mut violations);
        debug!(rule = %rule.id, found = violations.len() - before, "checked rule");
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Rule;

    #[test]
    fn catalog_order_wins_over_document_order() {
        let document: Document = serde_yaml::from_str(
            r#"
paths:
  /a:
    get: {}
  /b:
    get: {}
"#,
        )
        .unwrap();
        let catalog = RuleCatalog {
            rules: vec![
                Rule::new("VER001", "version"),
                Rule::new("NOPE001", "unknown"),
                Rule::new("SEC004", "security"),
            ],
        };

        let found: Vec<(String, String)> = validate(&document, &catalog)
            .into_iter()
            .map(|v| (v.rule_id.clone(), v.path().unwrap_or_default().to_string()))
            .collect();
        assert_eq!(
            found,
            [
                ("VER001".to_string(), "/a".to_string()),
                ("VER001".to_string(), "/b".to_string()),
                ("SEC004".to_string(), "/a".to_string()),
                ("SEC004".to_string(), "/b".to_string()),
            ]
        );
    }
}
