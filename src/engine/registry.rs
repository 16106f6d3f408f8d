//! Rule id -> (check, fix) dispatch table.

use super::checks::{self, CheckFn};
use super::handlers::{self, FixFn};
use crate::catalog::RuleCatalog;

pub struct RuleHandler {
    pub id: &'static str,
    pub check: CheckFn,
    /// `None` for report-only rules.
    pub fix: Option<FixFn>,
}

pub const HANDLERS: &[RuleHandler] = &[
    RuleHandler {
        id: "SEC002",
        check: checks::oauth_scopes,
        fix: Some(handlers::oauth_scopes),
    },
    RuleHandler {
        id: "SEC003",
        check: checks::https_servers,
        fix: Some(handlers::https_servers),
    },
    RuleHandler {
        id: "SEC004",
        check: checks::security_present,
        fix: Some(handlers::security_scheme),
    },
    RuleHandler {
        id: "PERF001",
        check: checks::rate_limit_headers,
        fix: Some(handlers::rate_limit_headers_fix),
    },
    RuleHandler {
        id: "PERF002",
        check: checks::cache_header,
        fix: Some(handlers::cache_header_fix),
    },
    RuleHandler {
        id: "PRIV001",
        check: checks::card_numbers,
        fix: None,
    },
    RuleHandler {
        id: "PRIV002",
        check: checks::personal_data,
        fix: None,
    },
    RuleHandler {
        id: "CONSIST001",
        check: checks::parameter_naming,
        fix: Some(handlers::parameter_naming),
    },
    RuleHandler {
        id: "CONSIST002",
        check: checks::property_naming,
        fix: Some(handlers::property_naming),
    },
    RuleHandler {
        id: "DEP001",
        check: checks::deprecation_notes,
        fix: Some(handlers::deprecation_notes),
    },
    RuleHandler {
        id: "VER001",
        check: checks::path_versioning,
        fix: Some(handlers::path_versioning),
    },
    RuleHandler {
        id: "DOC001",
        check: checks::operation_description,
        fix: Some(handlers::operation_description),
    },
    RuleHandler {
        id: "OP_ID001",
        check: checks::operation_id,
        fix: Some(handlers::operation_id),
    },
    RuleHandler {
        id: "OP_SUM001",
        check: checks::operation_summary,
        fix: Some(handlers::operation_summary),
    },
    RuleHandler {
        id: "PARAM001",
        check: checks::path_parameters,
        fix: Some(handlers::path_parameters),
    },
    RuleHandler {
        id: "PARAM_DESC001",
        check: checks::parameter_descriptions,
        fix: Some(handlers::parameter_descriptions),
    },
    RuleHandler {
        id: "RESP001",
        check: checks::response_content,
        fix: Some(handlers::response_content),
    },
    RuleHandler {
        id: "REQ_BODY001",
        check: checks::request_body_description,
        fix: Some(handlers::request_body_description),
    },
    RuleHandler {
        id: "SERVER001",
        check: checks::server_urls,
        fix: None,
    },
    RuleHandler {
        id: "SCHEMA_DESC001",
        check: checks::property_descriptions,
        fix: Some(handlers::property_descriptions),
    },
];

pub fn lookup(id: &str) -> Option<&'static RuleHandler> {
    HANDLERS.iter().find(|handler| handler.id == id)
}

/// The closest known rule id, if any is within a small edit distance.
pub fn suggest(id: &str) -> Option<&'static str> {
    let wanted = id.to_ascii_uppercase();
    HANDLERS
        .iter()
        .map(|handler| (handler.id, strsim::levenshtein(&wanted, handler.id)))
        .filter(|(_, distance)| *distance <= 2)
        .min_by_key(|(_, distance)| *distance)
        .map(|(known, _)| known)
}

/// A catalog rule with no built-in behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRule {
    pub id: String,
    pub suggestion: Option<&'static str>,
}

pub fn unknown_rules(catalog: &RuleCatalog) -> Vec<UnknownRule> {
    catalog
        .ids()
        .filter(|id| lookup(id).is_none())
        .map(|id| UnknownRule {
            id: id.to_string(),
            suggestion: suggest(id),
        })
        .collect()
}
