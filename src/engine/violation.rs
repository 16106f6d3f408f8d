use crate::catalog::{FixTemplate, Rule};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Where in the document a violation was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An operation, addressed by path key and lowercase method.
    Operation { path: String, method: String },
    /// A whole path entry (every method under it).
    Path { path: String },
    /// A named schema under `components.schemas`.
    Schema { name: String },
    /// The document as a whole (e.g. `servers`).
    Document,
}

impl Target {
    pub fn operation(path: &str, method: &str) -> Self {
        Target::Operation {
            path: path.to_string(),
            method: method.to_string(),
        }
    }

    pub fn path_entry(path: &str) -> Self {
        Target::Path {
            path: path.to_string(),
        }
    }

    pub fn schema(name: &str) -> Self {
        Target::Schema {
            name: name.to_string(),
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Target::Operation { path, .. } | Target::Path { path } => Some(path),
            Target::Schema { .. } | Target::Document => None,
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            Target::Operation { method, .. } => Some(method),
            _ => None,
        }
    }

    pub fn schema_name(&self) -> Option<&str> {
        match self {
            Target::Schema { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Operation { path, method } => write!(f, "{} {}", method.to_uppercase(), path),
            Target::Path { path } => write!(f, "path {path}"),
            Target::Schema { name } => write!(f, "schema {name}"),
            Target::Document => write!(f, "document"),
        }
    }
}

/// One failed rule at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub rule_id: String,
    pub description: String,
    pub target: Target,
    pub fix: Option<FixTemplate>,
}

impl Violation {
    pub fn new(rule: &Rule, target: Target) -> Self {
        Self {
            rule_id: rule.id.clone(),
            description: rule.description.clone(),
            target,
            fix: rule.fix.clone(),
        }
    }

    /// Like [`Violation::new`], naming the offending item (`parameter 'userId'`, ...).
    pub fn for_item(rule: &Rule, target: Target, item: impl fmt::Display) -> Self {
        let mut violation = Self::new(rule, target);
        violation.description = format!("{} for {item}", rule.description);
        violation
    }

    pub fn path(&self) -> Option<&str> {
        self.target.path()
    }

    pub fn method(&self) -> Option<&str> {
        self.target.method()
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.target.schema_name()
    }

    /// Point the violation at path key `to` if it currently refers to `from`.
    pub(crate) fn repoint(&mut self, from: &str, to: &str) -> bool {
        match &mut self.target {
            Target::Operation { path, .. } | Target::Path { path } if *path == from => {
                *path = to.to_string();
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} at {}", self.rule_id, self.description, self.target)
    }
}

impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.rule_id)?;
        map.serialize_entry("description", &self.description)?;
        if let Some(path) = self.path() {
            map.serialize_entry("path", path)?;
        }
        if let Some(method) = self.method() {
            map.serialize_entry("method", method)?;
        }
        if let Some(schema_name) = self.schema_name() {
            map.serialize_entry("schema_name", schema_name)?;
        }
        if let Some(fix) = &self.fix {
            map.serialize_entry("fix", fix)?;
        }
        map.end()
    }
}
