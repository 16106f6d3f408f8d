//! Run settings: where the rule catalog lives and how to reach the text generation service.
//!
//! Settings come from a TOML file (explicit path, `./cartlis.toml`, then `~/.cartlis.toml`),
//! and environment variables override the backfill credentials and model.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const SETTINGS_FILE_NAME: &str = "cartlis.toml";
pub const DEFAULT_RULES_PATH: &str = "rules/base_rules.yaml";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML ({}): {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid settings ({}): {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub rules: RuleSettings,
    pub backfill: BackfillSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RuleSettings {
    pub path: PathBuf,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_RULES_PATH),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BackfillSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 100,
            timeout_secs: 30,
        }
    }
}

impl BackfillSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backfill only talks to the service when enabled and a key is configured.
    pub fn is_usable(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}

impl Settings {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.backfill.temperature) {
            return Err(format!(
                "backfill.temperature must be between 0 and 2, got {}",
                self.backfill.temperature
            ));
        }
        if self.backfill.timeout_secs == 0 {
            return Err("backfill.timeout_secs must be greater than zero".to_string());
        }
        if self.backfill.endpoint.trim().is_empty() {
            return Err("backfill.endpoint must not be empty".to_string());
        }
        Ok(())
    }

    /// Apply `CARTLIS_*` overrides, falling back to the conventional `OPENAI_API_KEY` and
    /// `AI_MODEL` variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = first_set(&lookup, &["CARTLIS_API_KEY", "OPENAI_API_KEY"]) {
            self.backfill.api_key = Some(key);
        }
        if let Some(model) = first_set(&lookup, &["CARTLIS_MODEL", "AI_MODEL"]) {
            self.backfill.model = model;
        }
        if let Some(endpoint) = first_set(&lookup, &["CARTLIS_ENDPOINT"]) {
            self.backfill.endpoint = endpoint;
        }
    }

    /// Resolve settings for a run.
    ///
    /// Priority order:
    /// 1. Explicit `--config` path (must exist)
    /// 2. `./cartlis.toml`
    /// 3. `~/.cartlis.toml`
    /// 4. Built-in defaults
    ///
    /// Environment overrides are applied last.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match explicit {
            Some(path) => load_from_path(path)?,
            None => match discover() {
                Some(path) => load_from_path(&path)?,
                None => Settings::default(),
            },
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }
}

fn first_set(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|&name| lookup(name).filter(|value| !value.trim().is_empty()))
}

fn discover() -> Option<PathBuf> {
    let local = PathBuf::from(SETTINGS_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let home = home::home_dir()?.join(format!(".{SETTINGS_FILE_NAME}"));
    home.is_file().then_some(home)
}

pub fn load_from_str(input: &str, path: &Path) -> Result<Settings, SettingsError> {
    let settings: Settings = toml_edit::de::from_str(input).map_err(|source| SettingsError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    settings
        .validate()
        .map_err(|message| SettingsError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
    Ok(settings)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, path)
}
