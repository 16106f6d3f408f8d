use super::model::Document;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Serialization format of an API document, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read API document {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse API document {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to serialize API document: {0}")]
    Serialize(String),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A document together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub format: Format,
    pub source: String,
    pub document: Document,
}

pub fn parse_str(input: &str, format: Format) -> Result<Document, String> {
    match format {
        Format::Yaml => serde_yaml::from_str(input).map_err(|err| err.to_string()),
        Format::Json => serde_json::from_str(input).map_err(|err| err.to_string()),
    }
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<LoadedDocument, DocumentError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let format = Format::from_path(path);
    let document = parse_str(&source, format).map_err(|message| DocumentError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(LoadedDocument {
        path: path.to_path_buf(),
        format,
        source,
        document,
    })
}

pub fn to_string(document: &Document, format: Format) -> Result<String, DocumentError> {
    match format {
        Format::Yaml => serde_yaml::to_string(document)
            .map_err(|err| DocumentError::Serialize(err.to_string())),
        Format::Json => serde_json::to_string_pretty(document)
            .map(|mut text| {
                text.push('\n');
                text
            })
            .map_err(|err| DocumentError::Serialize(err.to_string())),
    }
}

/// Default location for a corrected document: `fixed_<name>` next to the input.
pub fn fixed_sibling_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "api_spec.yaml".to_string());
    input.with_file_name(format!("fixed_{name}"))
}

/// Write `contents` to `path` atomically (tempfile in the same directory, fsync, rename).
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), DocumentError> {
    let wrap = |source: std::io::Error| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(wrap)?;
    temp.write_all(contents.as_bytes()).map_err(wrap)?;
    temp.as_file().sync_all().map_err(wrap)?;
    temp.persist(path).map_err(|err| wrap(err.error))?;
    Ok(())
}
