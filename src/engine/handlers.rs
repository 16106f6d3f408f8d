//! Fix handlers, one per rule id.
//!
//! A handler receives the violation as it stands when it is dispatched (already re-pointed by
//! any earlier path move) and either edits the document or reports why it could not.

use super::checks::{
    is_versioned, property_lacks_description, undeclared_template_names, CACHE_HEADER,
    DEPRECATION_MARKER, OAUTH2_SCHEME, RATE_LIMIT_HEADERS,
};
use super::violation::{Target, Violation};
use crate::backfill::{Backfill, Generated};
use crate::document::{Document, Operation, Parameter, Response, DEFAULT_RESPONSE_DESCRIPTION};
use crate::naming::{to_camel_case, to_snake_case};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

pub type FixFn = fn(&mut Document, &Violation, &Backfill) -> Result<Applied, Skip>;

/// What a handler did to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Edited in place; `fallbacks` counts backfilled texts that degraded to the placeholder.
    Edited { fallbacks: usize },
    /// Moved a path entry to a new key.
    Moved { from: String, to: String },
}

impl Applied {
    fn edited() -> Self {
        Applied::Edited { fallbacks: 0 }
    }
}

/// Why a handler left the document untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub reason: String,
}

impl Skip {
    fn missing(target: &Target) -> Self {
        Self {
            reason: format!("{target} no longer exists"),
        }
    }

    fn wrong_target(target: &Target) -> Self {
        Self {
            reason: format!("handler cannot address {target}"),
        }
    }
}

pub(crate) const DEPRECATION_NOTE: &str = "\nUse the following alternative: /v2/transactions.";
pub(crate) const REQUEST_BODY_PLACEHOLDER: &str = "Description not provided.";
pub(crate) const DEFAULT_CONTENT_REF: &str = "#/components/schemas/Pet";
const CACHE_DIRECTIVE: &str = "Caching directive for improving performance";

fn operation_target<'a>(
    document: &'a mut Document,
    violation: &Violation,
) -> Result<(String, String, &'a mut Operation), Skip> {
    let Target::Operation { path, method } = &violation.target else {
        return Err(Skip::wrong_target(&violation.target));
    };
    let operation = document
        .operation_mut(path, method)
        .ok_or_else(|| Skip::missing(&violation.target))?;
    Ok((path.clone(), method.clone(), operation))
}

fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let mut map = Mapping::with_capacity(N);
    for (key, value) in entries {
        map.insert(Value::from(key), value);
    }
    Value::Mapping(map)
}

fn typed_schema(kind: &str) -> Value {
    mapping([("type", Value::from(kind))])
}

fn rate_limit_headers() -> Vec<(String, Value)> {
    RATE_LIMIT_HEADERS
        .iter()
        .map(|name| (name.to_string(), mapping([("schema", typed_schema("integer"))])))
        .collect()
}

fn cache_headers() -> Vec<(String, Value)> {
    let schema = mapping([
        ("type", Value::from("string")),
        ("description", Value::from(CACHE_DIRECTIVE)),
    ]);
    vec![(CACHE_HEADER.to_string(), mapping([("schema", schema)]))]
}

fn default_content() -> (String, Value) {
    let schema = mapping([("$ref", Value::from(DEFAULT_CONTENT_REF))]);
    (
        "application/json".to_string(),
        mapping([("schema", schema)]),
    )
}

pub fn oauth_scopes(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (_, _, operation) = operation_target(document, violation)?;
    let scopes = Value::Sequence(vec![Value::from("write"), Value::from("read")]);
    let mut requirement = Mapping::new();
    requirement.insert(Value::from(OAUTH2_SCHEME), scopes);
    operation.security = Some(vec![requirement]);
    Ok(Applied::edited())
}

pub fn https_servers(
    document: &mut Document,
    _violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    for server in &mut document.servers {
        if let Some(url) = &mut server.url {
            if let Some(rest) = url.strip_prefix("http://") {
                let upgraded = format!("https://{rest}");
                debug!(from = %url, to = %upgraded, "upgraded server URL");
                *url = upgraded;
            }
        }
    }
    Ok(Applied::edited())
}

pub fn security_scheme(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (_, _, operation) = operation_target(document, violation)?;
    if operation.security.is_none() {
        let implicit = mapping([
            (
                "authorizationUrl",
                Value::from("https://example.com/oauth/authorize"),
            ),
            (
                "scopes",
                mapping([
                    ("read", Value::from("Grants read access")),
                    ("write", Value::from("Grants write access")),
                ]),
            ),
        ]);
        let flows = mapping([("flows", mapping([("implicit", implicit)]))]);
        let mut requirement = Mapping::new();
        requirement.insert(Value::from(OAUTH2_SCHEME), flows);
        operation.security = Some(vec![requirement]);
    }
    Ok(Applied::edited())
}

pub fn rate_limit_headers_fix(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (_, _, operation) = operation_target(document, violation)?;
    operation
        .response_or_insert("200")
        .merge_headers(rate_limit_headers());
    Ok(Applied::edited())
}

pub fn cache_header_fix(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (_, _, operation) = operation_target(document, violation)?;
    operation
        .response_or_insert("200")
        .merge_headers(cache_headers());
    Ok(Applied::edited())
}

pub fn parameter_naming(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (_, _, operation) = operation_target(document, violation)?;
    for param in &mut operation.parameters {
        if let Some(name) = &mut param.name {
            let renamed = to_snake_case(name);
            if renamed != *name {
                debug!(from = %name, to = %renamed, "renamed parameter");
                *name = renamed;
            }
        }
    }
    Ok(Applied::edited())
}

pub fn property_naming(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let Target::Schema { name } = &violation.target else {
        return Err(Skip::wrong_target(&violation.target));
    };
    let schema = document
        .schema_mut(name)
        .ok_or_else(|| Skip::missing(&violation.target))?;
    if let Some(properties) = schema.properties.take() {
        let renamed: IndexMap<String, Value> = properties
            .into_iter()
            .map(|(key, value)| (to_camel_case(&key), value))
            .collect();
        schema.properties = Some(renamed);
    }
    Ok(Applied::edited())
}

pub fn deprecation_notes(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let Target::Path { path } = &violation.target else {
        return Err(Skip::wrong_target(&violation.target));
    };
    let item = document
        .path_item_mut(path)
        .ok_or_else(|| Skip::missing(&violation.target))?;
    for operation in item.operations.values_mut() {
        operation.deprecated = Some(true);
        if let Some(description) = &mut operation.description {
            if !description.contains(DEPRECATION_MARKER) {
                description.push_str(DEPRECATION_NOTE);
            }
        }
    }
    Ok(Applied::edited())
}

/// `/v1` + the old key; keys without a leading slash get `/v1/`.
pub(crate) fn versioned_key(path: &str) -> String {
    if path.starts_with('/') {
        format!("/v1{path}")
    } else {
        format!("/v1/{path}")
    }
}

pub fn path_versioning(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let Target::Path { path } = &violation.target else {
        return Err(Skip::wrong_target(&violation.target));
    };
    if is_versioned(path) {
        return Err(Skip {
            reason: format!("{path} is already versioned"),
        });
    }
    let to = versioned_key(path);
    if document.path_item(&to).is_some() {
        warn!(from = %path, to = %to, "versioned path already exists; leaving both entries in place");
        return Err(Skip {
            reason: format!("{to} already exists"),
        });
    }
    if !document.move_path(path, &to) {
        return Err(Skip::missing(&violation.target));
    }
    Ok(Applied::Moved {
        from: path.clone(),
        to,
    })
}

pub fn operation_description(
    document: &mut Document,
    violation: &Violation,
    backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (path, method, operation) = operation_target(document, violation)?;
    if operation.has_description() {
        return Ok(Applied::edited());
    }
    let generated = backfill.generate(&format!(
        "Generate a description for {} {path}",
        method.to_uppercase()
    ));
    let degraded = usize::from(generated.is_fallback());
    operation.description = Some(generated.into_text());
    Ok(Applied::Edited {
        fallbacks: degraded,
    })
}

pub fn operation_id(
    document: &mut Document,
    violation: &Violation,
    backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (path, method, operation) = operation_target(document, violation)?;
    if operation.operation_id.is_some() {
        return Ok(Applied::edited());
    }
    let generated = backfill.generate(&format!(
        "Generate a unique operation ID for an API operation handling {} request at {path}.",
        method.to_uppercase()
    ));
    let degraded = usize::from(generated.is_fallback());
    operation.operation_id = Some(match generated {
        Generated::Generated(text) => text,
        Generated::Fallback { .. } => format!("operationId_placeholder_{method}"),
    });
    Ok(Applied::Edited {
        fallbacks: degraded,
    })
}

pub fn operation_summary(
    document: &mut Document,
    violation: &Violation,
    backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (path, method, operation) = operation_target(document, violation)?;
    if operation.has_summary() {
        return Ok(Applied::edited());
    }
    let generated = backfill.generate(&format!(
        "Generate a concise summary for the {} operation at {path}.",
        method.to_uppercase()
    ));
    let degraded = usize::from(generated.is_fallback());
    operation.summary = Some(generated.into_text());
    Ok(Applied::Edited {
        fallbacks: degraded,
    })
}

pub fn path_parameters(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let Target::Operation { path, method } = &violation.target else {
        return Err(Skip::wrong_target(&violation.target));
    };
    let missing = {
        let operation = document
            .operation(path, method)
            .ok_or_else(|| Skip::missing(&violation.target))?;
        undeclared_template_names(document, path, operation)
    };
    let (_, _, operation) = operation_target(document, violation)?;

    for param in operation.parameters.iter_mut().filter(|p| p.is_path()) {
        if !param.has_schema() {
            param.schema = Some(typed_schema("string"));
        }
    }
    for name in missing {
        debug!(%path, %method, parameter = %name, "declared missing path parameter");
        operation.parameters.push(Parameter {
            description: Some(format!("The {name} path parameter")),
            name: Some(name),
            location: Some("path".to_string()),
            required: Some(true),
            schema: Some(typed_schema("string")),
            ..Parameter::default()
        });
    }
    Ok(Applied::edited())
}

pub fn parameter_descriptions(
    document: &mut Document,
    violation: &Violation,
    backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (path, method, operation) = operation_target(document, violation)?;
    let mut degraded = 0;
    for param in operation.parameters.iter_mut().filter(|p| !p.has_description()) {
        let generated = backfill.generate(&format!(
            "Generate a description for the {} parameter in the {} operation at {path}.",
            param.name.as_deref().unwrap_or("unnamed"),
            method.to_uppercase()
        ));
        degraded += usize::from(generated.is_fallback());
        param.description = Some(generated.into_text());
    }
    Ok(Applied::Edited {
        fallbacks: degraded,
    })
}

pub fn response_content(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (_, _, operation) = operation_target(document, violation)?;
    for slot in operation.responses.values_mut() {
        let response = slot.get_or_insert_with(|| Response::described(DEFAULT_RESPONSE_DESCRIPTION));
        if !response.has_content() {
            let (media_type, definition) = default_content();
            response.content_or_insert().insert(media_type, definition);
        }
        response.merge_headers(rate_limit_headers());
        response.merge_headers(cache_headers());
    }
    Ok(Applied::edited())
}

pub fn request_body_description(
    document: &mut Document,
    violation: &Violation,
    _backfill: &Backfill,
) -> Result<Applied, Skip> {
    let (_, _, operation) = operation_target(document, violation)?;
    if let Some(body) = &mut operation.request_body {
        if !body.has_description() {
            body.description = Some(REQUEST_BODY_PLACEHOLDER.to_string());
        }
    }
    Ok(Applied::edited())
}

pub fn property_descriptions(
    document: &mut Document,
    violation: &Violation,
    backfill: &Backfill,
) -> Result<Applied, Skip> {
    let Target::Schema { name } = &violation.target else {
        return Err(Skip::wrong_target(&violation.target));
    };
    let schema = document
        .schema_mut(name)
        .ok_or_else(|| Skip::missing(&violation.target))?;
    let mut degraded = 0;
    for (field, property) in schema.properties.iter_mut().flatten() {
        if !property_lacks_description(property) {
            continue;
        }
        let generated = backfill.generate(&format!(
            "Generate a description for the '{field}' field in the {name} schema."
        ));
        degraded += usize::from(generated.is_fallback());
        let description = Value::from(generated.into_text());
        match property {
            Value::Mapping(fields) => {
                fields.insert(Value::from("description"), description);
            }
            other => *other = mapping([("description", description)]),
        }
    }
    Ok(Applied::Edited {
        fallbacks: degraded,
    })
}
