//! Rule predicates. Each appends one violation per failing location, in document order, and
//! never touches the document.

use super::violation::{Target, Violation};
use crate::catalog::Rule;
use crate::document::{Document, Operation, Response};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;

pub type CheckFn = fn(&Document, &Rule, &mut Vec<Violation>);

pub(crate) const OAUTH2_SCHEME: &str = "OAuth2";
pub(crate) const RATE_LIMIT_HEADERS: [&str; 3] =
    ["X-RateLimit-Limit", "X-RateLimit-Remaining", "X-RateLimit-Reset"];
pub(crate) const CACHE_HEADER: &str = "Cache-Control";
pub(crate) const DEPRECATION_MARKER: &str = "Use the following alternative:";

fn snake_case_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z]+_)*[a-z]+$").expect("snake_case pattern is valid"))
}

fn camel_case_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("camelCase pattern is valid"))
}

fn versioned_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/v[0-9]+/").expect("version prefix pattern is valid"))
}

fn template_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(.*?)\}").expect("template pattern is valid"))
}

/// `{name}` segments of a path key, in order.
pub(crate) fn template_names(path: &str) -> Vec<&str> {
    template_segment()
        .captures_iter(path)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Template names of `path` that neither the operation nor the path item declare as `in: path`.
pub(crate) fn undeclared_template_names(
    document: &Document,
    path: &str,
    operation: &Operation,
) -> Vec<String> {
    let shared = document
        .path_item(path)
        .map(|item| item.shared_path_parameter_names())
        .unwrap_or_default();
    template_names(path)
        .into_iter()
        .filter(|name| {
            !shared.contains(name)
                && !operation
                    .path_parameters()
                    .any(|param| param.name.as_deref() == Some(*name))
        })
        .map(str::to_string)
        .collect()
}

pub(crate) fn is_versioned(path: &str) -> bool {
    versioned_path().is_match(path)
}

/// Headers of the `200` response; an explicit null reads as "no headers".
fn ok_response(operation: &Operation) -> Option<Option<&Response>> {
    operation
        .declares_response("200")
        .then(|| operation.response("200"))
}

fn lacks_header(response: Option<&Response>, name: &str) -> bool {
    !response.is_some_and(|response| response.has_header(name))
}

pub(crate) fn property_lacks_description(property: &Value) -> bool {
    match property {
        Value::Null => true,
        Value::Mapping(fields) => !fields.contains_key("description"),
        _ => false,
    }
}

fn each_operation(
    document: &Document,
    rule: &Rule,
    out: &mut Vec<Violation>,
    failing: impl Fn(&Operation) -> bool,
) {
    for (path, method, operation) in document.operations() {
        if failing(operation) {
            out.push(Violation::new(rule, Target::operation(path, method)));
        }
    }
}

pub fn oauth_scopes(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| {
        !op.first_security_requirement_names(OAUTH2_SCHEME)
    });
}

pub fn https_servers(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    let insecure = document
        .servers
        .iter()
        .filter_map(|server| server.url.as_deref())
        .filter(|url| url.starts_with("http://"))
        .count();
    if insecure > 0 {
        out.push(Violation::for_item(
            rule,
            Target::Document,
            format!("{insecure} server URL(s) using http://"),
        ));
    }
}

pub fn security_present(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| op.security.is_none());
}

pub fn rate_limit_headers(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| {
        ok_response(op).is_some_and(|response| {
            RATE_LIMIT_HEADERS
                .iter()
                .any(|header| lacks_header(response, header))
        })
    });
}

pub fn cache_header(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| {
        ok_response(op).is_some_and(|response| lacks_header(response, CACHE_HEADER))
    });
}

/// Property names of each inline `application/json` response schema, keyed by status code.
fn json_response_properties(operation: &Operation) -> impl Iterator<Item = (&str, &Mapping)> {
    operation.responses.iter().filter_map(|(code, response)| {
        let properties = response
            .as_ref()?
            .content
            .as_ref()?
            .get("application/json")?
            .get("schema")?
            .get("properties")?
            .as_mapping()?;
        Some((code.as_str(), properties))
    })
}

fn exposed_fields(document: &Document, rule: &Rule, out: &mut Vec<Violation>, fields: &[&str]) {
    for (path, method, operation) in document.operations() {
        for (code, properties) in json_response_properties(operation) {
            for field in fields.iter().filter(|field| properties.contains_key(**field)) {
                out.push(Violation::for_item(
                    rule,
                    Target::operation(path, method),
                    format!("field '{field}' in response '{code}'"),
                ));
            }
        }
    }
}

pub fn card_numbers(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    exposed_fields(document, rule, out, &["credit_card_number"]);
}

pub fn personal_data(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    exposed_fields(document, rule, out, &["email", "phone_number"]);
}

pub fn parameter_naming(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for (path, method, operation) in document.operations() {
        for name in operation.parameters.iter().filter_map(|p| p.name.as_deref()) {
            if !snake_case_name().is_match(name) {
                out.push(Violation::for_item(
                    rule,
                    Target::operation(path, method),
                    format!("parameter '{name}'"),
                ));
            }
        }
    }
}

pub fn property_naming(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for (name, schema) in document.schemas() {
        let offending = schema
            .properties
            .iter()
            .flat_map(|properties| properties.keys())
            .filter(|key| !camel_case_name().is_match(key))
            .count();
        if offending > 0 {
            out.push(Violation::for_item(
                rule,
                Target::schema(name),
                format!("{offending} property name(s)"),
            ));
        }
    }
}

pub fn deprecation_notes(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for (path, item) in &document.paths.entries {
        let undocumented = item.operations.values().any(|op| {
            op.deprecated == Some(true)
                && op
                    .description
                    .as_deref()
                    .is_some_and(|text| !text.contains(DEPRECATION_MARKER))
        });
        if undocumented {
            out.push(Violation::new(rule, Target::path_entry(path)));
        }
    }
}

pub fn path_versioning(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for path in document.paths.entries.keys() {
        if !is_versioned(path) {
            out.push(Violation::new(rule, Target::path_entry(path)));
        }
    }
}

pub fn operation_description(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| !op.has_description());
}

pub fn operation_id(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| op.operation_id.is_none());
}

pub fn operation_summary(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| !op.has_summary());
}

pub fn path_parameters(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for (path, method, operation) in document.operations() {
        for param in operation.path_parameters().filter(|p| !p.has_schema()) {
            out.push(Violation::for_item(
                rule,
                Target::operation(path, method),
                format!("parameter '{}'", param.name.as_deref().unwrap_or_default()),
            ));
        }
        for name in undeclared_template_names(document, path, operation) {
            out.push(Violation::for_item(
                rule,
                Target::operation(path, method),
                format!("undeclared parameter '{name}'"),
            ));
        }
    }
}

pub fn parameter_descriptions(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| {
        op.parameters.iter().any(|param| !param.has_description())
    });
}

pub fn response_content(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for (path, method, operation) in document.operations() {
        for (code, response) in &operation.responses {
            if response.as_ref().is_some_and(|response| !response.has_content()) {
                out.push(Violation::for_item(
                    rule,
                    Target::operation(path, method),
                    format!("response '{code}'"),
                ));
            }
        }
    }
}

pub fn request_body_description(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    each_operation(document, rule, out, |op| {
        op.request_body
            .as_ref()
            .is_some_and(|body| !body.has_description())
    });
}

pub fn server_urls(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for url in document.servers.iter().filter_map(|server| server.url.as_deref()) {
        if url.contains("localhost") || url.contains("example.com") {
            out.push(Violation::for_item(
                rule,
                Target::Document,
                format!("server '{url}'"),
            ));
        }
    }
}

pub fn property_descriptions(document: &Document, rule: &Rule, out: &mut Vec<Violation>) {
    for (name, schema) in document.schemas() {
        let undocumented = schema
            .properties
            .iter()
            .flat_map(|properties| properties.values())
            .any(property_lacks_description);
        if undocumented {
            out.push(Violation::new(rule, Target::schema(name)));
        }
    }
}
