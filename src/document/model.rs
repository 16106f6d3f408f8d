//! Typed OpenAPI document tree.
//!
//! Only the fields the governance rules read or write are modelled; every other key is kept in
//! an `extra` mapping so a load/dump round-trip does not drop anything.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// HTTP methods recognised as operation keys inside a path item.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub servers: Vec<Server>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paths: Paths,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// The `paths` object: path items by key, and `x-` extensions kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paths {
    pub entries: IndexMap<String, PathItem>,
    pub extensions: Mapping,
}

/// A `paths` entry: operations keyed by lowercase HTTP method, plus path-level keys
/// (`summary`, `parameters`, `$ref`, ...) kept verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItem {
    pub operations: IndexMap<String, Operation>,
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        rename = "operationId",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Mapping>>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub parameters: Vec<Parameter>,
    #[serde(
        rename = "requestBody",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body: Option<RequestBody>,
    #[serde(
        default,
        deserialize_with = "status_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub responses: IndexMap<String, Option<Response>>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub headers: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, Value>>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub schemas: IndexMap<String, Schema>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Value>>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl<'de> Deserialize<'de> for Paths {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Mapping>::deserialize(deserializer)?.unwrap_or_default();
        let mut paths = Paths::default();
        for (key, value) in raw {
            let path = key
                .as_str()
                .filter(|name| !name.starts_with("x-"))
                .map(str::to_string);
            match path {
                Some(path) => {
                    let item = serde_yaml::from_value(value)
                        .map_err(|err| D::Error::custom(format!("path `{path}`: {err}")))?;
                    paths.entries.insert(path, item);
                }
                None => {
                    paths.extensions.insert(key, value);
                }
            }
        }
        Ok(paths)
    }
}

impl Serialize for Paths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map =
            serializer.serialize_map(Some(self.entries.len() + self.extensions.len()))?;
        for (path, item) in &self.entries {
            map.serialize_entry(path, item)?;
        }
        for (key, value) in &self.extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Mapping>::deserialize(deserializer)?.unwrap_or_default();
        let mut item = PathItem::default();
        for (key, value) in raw {
            let method = key
                .as_str()
                .filter(|name| HTTP_METHODS.contains(name))
                .map(str::to_string);
            match method {
                Some(method) => {
                    let operation = if value.is_null() {
                        Operation::default()
                    } else {
                        serde_yaml::from_value(value).map_err(|err| {
                            D::Error::custom(format!("operation `{method}`: {err}"))
                        })?
                    };
                    item.operations.insert(method, operation);
                }
                None => {
                    item.extra.insert(key, value);
                }
            }
        }
        Ok(item)
    }
}

impl Serialize for PathItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.extra.len() + self.operations.len()))?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        for (method, operation) in &self.operations {
            map.serialize_entry(method, operation)?;
        }
        map.end()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Free text that YAML may read as a number or boolean (`summary: 2024`) keeps its text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string, found {other:?}"
        ))),
    }
}

/// `responses` keys are status codes that YAML happily reads as integers (`200:`);
/// normalise them to strings and keep explicit nulls as `None`.
fn status_map<'de, D>(deserializer: D) -> Result<IndexMap<String, Option<Response>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Mapping>::deserialize(deserializer)?.unwrap_or_default();
    let mut responses = IndexMap::with_capacity(raw.len());
    for (key, value) in raw {
        let code = match key {
            Value::String(code) => code,
            Value::Number(code) => code.to_string(),
            other => {
                return Err(D::Error::custom(format!(
                    "response status key must be a string or integer, found {other:?}"
                )))
            }
        };
        let response = if value.is_null() {
            None
        } else {
            Some(
                serde_yaml::from_value(value)
                    .map_err(|err| D::Error::custom(format!("response `{code}`: {err}")))?,
            )
        };
        responses.insert(code, response);
    }
    Ok(responses)
}
