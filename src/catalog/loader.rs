use crate::catalog::schema::{RuleCatalog, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read rule catalog from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule catalog YAML{}: {source}", display_path(.path))]
    Yaml {
        path: Option<PathBuf>,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid rule catalog{}: {source}", display_path(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },

    #[error("no .yaml rule files found in {}", .path.display())]
    NoRuleFiles { path: PathBuf },

    #[error("failed to list rule directory {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

impl CatalogError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            CatalogError::Yaml { path: None, source } => CatalogError::Yaml {
                path: Some(path),
                source,
            },
            CatalogError::Validation { path: None, source } => CatalogError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RuleCatalog, CatalogError> {
    let catalog = parse(input)?;
    catalog
        .validate()
        .map_err(|source| CatalogError::Validation { path: None, source })?;
    Ok(catalog)
}

/// Load a catalog from a YAML file, or from every `*.yaml`/`*.yml` file directly inside a
/// directory (in file-name order, concatenated).
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleCatalog, CatalogError> {
    let path = path.as_ref();
    if path.is_dir() {
        return load_from_dir(path);
    }
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

fn load_from_dir(dir: &Path) -> Result<RuleCatalog, CatalogError> {
    let files = discover_rule_files(dir)?;
    if files.is_empty() {
        return Err(CatalogError::NoRuleFiles {
            path: dir.to_path_buf(),
        });
    }

    let mut catalog = RuleCatalog::default();
    for file in files {
        let contents = fs::read_to_string(&file).map_err(|source| CatalogError::Io {
            path: file.clone(),
            source,
        })?;
        catalog.extend(parse(&contents).map_err(|error| error.with_path(&file))?);
    }
    catalog
        .validate()
        .map_err(|source| CatalogError::Validation {
            path: Some(dir.to_path_buf()),
            source,
        })?;
    Ok(catalog)
}

fn discover_rule_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry.map_err(|source| CatalogError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_yaml = matches!(
            entry.path().extension().and_then(|ext| ext.to_str()),
            Some("yaml" | "yml")
        );
        if entry.file_type().is_file() && is_yaml {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn parse(input: &str) -> Result<RuleCatalog, CatalogError> {
    serde_yaml::from_str(input).map_err(|source| CatalogError::Yaml { path: None, source })
}
