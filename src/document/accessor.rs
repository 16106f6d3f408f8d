//! Navigation and mutation helpers over the document tree.
//!
//! Every lookup returns `Option` instead of failing, so validators and fix handlers never
//! have to walk the tree by hand or guard against missing keys themselves.

use super::model::{Document, Operation, Parameter, PathItem, RequestBody, Response, Schema};
use indexmap::IndexMap;
use serde_yaml::Value;

/// Description given to responses that were explicitly null.
pub const DEFAULT_RESPONSE_DESCRIPTION: &str = "Default response";

impl Document {
    /// Iterate `(path, method, operation)` in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &str, &Operation)> {
        self.paths.entries.iter().flat_map(|(path, item)| {
            item.operations
                .iter()
                .map(move |(method, operation)| (path.as_str(), method.as_str(), operation))
        })
    }

    pub fn path_item(&self, path: &str) -> Option<&PathItem> {
        self.paths.entries.get(path)
    }

    pub fn path_item_mut(&mut self, path: &str) -> Option<&mut PathItem> {
        self.paths.entries.get_mut(path)
    }

    pub fn operation(&self, path: &str, method: &str) -> Option<&Operation> {
        self.paths.entries.get(path)?.operations.get(method)
    }

    pub fn operation_mut(&mut self, path: &str, method: &str) -> Option<&mut Operation> {
        self.paths.entries.get_mut(path)?.operations.get_mut(method)
    }

    pub fn schemas(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.components
            .iter()
            .flat_map(|components| components.schemas.iter())
            .map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.components.as_mut()?.schemas.get_mut(name)
    }

    /// Move a path entry to a key that is not in use. The entry is re-inserted at the end of
    /// `paths`.
    ///
    /// Returns `false` and leaves the document untouched when `from` is missing or `to` is
    /// already taken.
    pub fn move_path(&mut self, from: &str, to: &str) -> bool {
        if self.paths.entries.contains_key(to) {
            return false;
        }
        let Some(moved) = self.paths.entries.shift_remove(from) else {
            return false;
        };
        self.paths.entries.insert(to.to_string(), moved);
        true
    }

    /// Replace every explicitly null response with a minimal described response.
    ///
    /// Returns the number of responses replaced; a second call on the same document returns 0.
    pub fn sanitize_null_responses(&mut self) -> usize {
        let mut replaced = 0;
        for item in self.paths.entries.values_mut() {
            for operation in item.operations.values_mut() {
                for slot in operation.responses.values_mut() {
                    if slot.is_none() {
                        *slot = Some(Response::described(DEFAULT_RESPONSE_DESCRIPTION));
                        replaced += 1;
                    }
                }
            }
        }
        replaced
    }
}

impl PathItem {
    /// Names of `in: path` parameters declared once for every method of the path.
    pub fn shared_path_parameter_names(&self) -> Vec<&str> {
        let Some(Value::Sequence(params)) = self.extra.get("parameters") else {
            return Vec::new();
        };
        params
            .iter()
            .filter(|param| param.get("in").and_then(Value::as_str) == Some("path"))
            .filter_map(|param| param.get("name").and_then(Value::as_str))
            .collect()
    }
}

impl Operation {
    /// A response by status code; explicitly null entries read as absent.
    pub fn response(&self, code: &str) -> Option<&Response> {
        self.responses.get(code)?.as_ref()
    }

    /// Whether the status code is listed at all, null or not.
    pub fn declares_response(&self, code: &str) -> bool {
        self.responses.contains_key(code)
    }

    /// The response for `code`, creating it (or replacing an explicit null) when needed.
    pub fn response_or_insert(&mut self, code: &str) -> &mut Response {
        self.responses
            .entry(code.to_string())
            .or_insert(None)
            .get_or_insert_with(|| Response::described(DEFAULT_RESPONSE_DESCRIPTION))
    }

    pub fn has_description(&self) -> bool {
        has_text(self.description.as_deref())
    }

    pub fn has_summary(&self) -> bool {
        has_text(self.summary.as_deref())
    }

    pub fn path_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|param| param.is_path())
    }

    /// Whether any entry of the first security requirement names the scheme.
    pub fn first_security_requirement_names(&self, scheme: &str) -> bool {
        self.security
            .as_ref()
            .and_then(|requirements| requirements.first())
            .is_some_and(|requirement| requirement.contains_key(scheme))
    }
}

impl Parameter {
    pub fn is_path(&self) -> bool {
        self.location.as_deref() == Some("path")
    }

    /// Absent, null and empty-mapping schemas all count as missing.
    pub fn has_schema(&self) -> bool {
        match &self.schema {
            None | Some(Value::Null) => false,
            Some(Value::Mapping(schema)) => !schema.is_empty(),
            Some(_) => true,
        }
    }

    pub fn has_description(&self) -> bool {
        has_text(self.description.as_deref())
    }
}

impl RequestBody {
    pub fn has_description(&self) -> bool {
        has_text(self.description.as_deref())
    }
}

impl Response {
    pub fn described(description: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            ..Self::default()
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Insert headers, replacing the definitions of any that already exist.
    pub fn merge_headers(&mut self, headers: impl IntoIterator<Item = (String, Value)>) {
        for (name, definition) in headers {
            self.headers.insert(name, definition);
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn content_or_insert(&mut self) -> &mut IndexMap<String, Value> {
        self.content.get_or_insert_with(IndexMap::new)
    }
}

fn has_text(text: Option<&str>) -> bool {
    text.is_some_and(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(yaml: &str) -> Document {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn operations_follow_document_order() {
        let doc = document(
            r#"
paths:
  /b:
    post: {}
    get: {}
  /a:
    delete: {}
"#,
        );
        let seen: Vec<(&str, &str)> = doc.operations().map(|(p, m, _)| (p, m)).collect();
        assert_eq!(seen, [("/b", "post"), ("/b", "get"), ("/a", "delete")]);
    }

    #[test]
    fn move_path_appends_under_new_key() {
        let mut doc = document(
            r#"
paths:
  /transactions:
    post:
      summary: create
  /v1/health:
    get: {}
"#,
        );
        let original = doc.paths.entries["/transactions"].clone();

        assert!(doc.move_path("/transactions", "/v1/transactions"));
        let keys: Vec<&str> = doc.paths.entries.keys().map(String::as_str).collect();
        assert_eq!(keys, ["/v1/health", "/v1/transactions"]);
        assert_eq!(doc.paths.entries["/v1/transactions"], original);
        assert!(!doc.move_path("/transactions", "/v1/transactions"));
    }

    #[test]
    fn move_path_refuses_an_occupied_key() {
        let mut doc = document(
            r#"
paths:
  /pets:
    get:
      summary: old
    post: {}
  /v1/pets:
    get:
      summary: new
"#,
        );
        let snapshot = doc.clone();

        assert!(!doc.move_path("/pets", "/v1/pets"));
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn path_extensions_are_not_operations() {
        let doc = document("paths:\n  x-internal: true\n  /v1/a:\n    get: {}\n");
        let seen: Vec<(&str, &str)> = doc.operations().map(|(p, m, _)| (p, m)).collect();
        assert_eq!(seen, [("/v1/a", "get")]);
        assert!(doc.path_item("x-internal").is_none());
    }

    #[test]
    fn sanitize_is_idempotent() {
        let mut doc = document(
            r#"
paths:
  /pets:
    get:
      responses:
        '200':
        '404':
          description: missing
"#,
        );
        assert_eq!(doc.sanitize_null_responses(), 1);
        let response = doc.operation("/pets", "get").unwrap().response("200").unwrap();
        assert_eq!(
            response.description.as_deref(),
            Some(DEFAULT_RESPONSE_DESCRIPTION)
        );
        let snapshot = doc.clone();
        assert_eq!(doc.sanitize_null_responses(), 0);
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn response_or_insert_replaces_null() {
        let mut operation = Operation::default();
        operation.responses.insert("200".to_string(), None);
        operation
            .response_or_insert("200")
            .merge_headers([("Cache-Control".to_string(), Value::Null)]);
        assert!(operation.response("200").unwrap().has_header("Cache-Control"));
    }

    #[test]
    fn shared_path_parameters_are_read_from_the_path_item() {
        let doc = document(
            r#"
paths:
  /pets/{pet_id}:
    parameters:
      - name: pet_id
        in: path
        required: true
      - name: verbose
        in: query
    get: {}
"#,
        );
        let item = doc.path_item("/pets/{pet_id}").unwrap();
        assert_eq!(item.shared_path_parameter_names(), ["pet_id"]);
    }

    #[test]
    fn empty_schema_mapping_counts_as_missing() {
        let param: Parameter = serde_yaml::from_str("name: id\nin: path\nschema: {}").unwrap();
        assert!(param.is_path());
        assert!(!param.has_schema());
    }
}
