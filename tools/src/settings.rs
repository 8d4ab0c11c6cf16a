use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const ENV_DATA_FILE: &str = "SOCIAL_GRAPH_DATA";
pub const ENV_TOP_K: &str = "SOCIAL_GRAPH_TOP_K";
pub const ENV_SUGGEST_LIMIT: &str = "SOCIAL_GRAPH_SUGGEST_LIMIT";
pub const ENV_AUTO_REINDEX: &str = "SOCIAL_GRAPH_AUTO_REINDEX";
pub const ENV_AUTOSAVE: &str = "SOCIAL_GRAPH_AUTOSAVE";

/// Upper bound for `default_top_k` and `suggest_limit`.
pub const MAX_RESULT_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("{name}: cannot parse '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Runtime settings for a session.
///
/// Sources, lowest priority first: built-in defaults, the TOML file,
/// `SOCIAL_GRAPH_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Save file loaded at startup and written by `save` without an argument.
    pub data_file: Option<PathBuf>,
    /// `K` used by recommendation commands when none is given.
    pub default_top_k: usize,
    /// `K` used by `suggest` when none is given.
    pub suggest_limit: usize,
    /// Rebuild the prefix index before a suggestion if the user set changed.
    pub auto_reindex: bool,
    /// Write `data_file` after every mutating command.
    pub autosave: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: None,
            default_top_k: 5,
            suggest_limit: 5,
            auto_reindex: true,
            autosave: false,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults or `path`, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply `SOCIAL_GRAPH_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_DATA_FILE).filter(|v| !v.is_empty()) {
            self.data_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(ENV_TOP_K) {
            self.default_top_k = parse_value(ENV_TOP_K, &v)?;
        }
        if let Some(v) = lookup(ENV_SUGGEST_LIMIT) {
            self.suggest_limit = parse_value(ENV_SUGGEST_LIMIT, &v)?;
        }
        if let Some(v) = lookup(ENV_AUTO_REINDEX) {
            self.auto_reindex = parse_bool(ENV_AUTO_REINDEX, &v)?;
        }
        if let Some(v) = lookup(ENV_AUTOSAVE) {
            self.autosave = parse_bool(ENV_AUTOSAVE, &v)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("default_top_k", self.default_top_k)?;
        check_range("suggest_limit", self.suggest_limit)?;
        Ok(())
    }
}

fn check_range(name: &'static str, value: usize) -> Result<(), SettingsError> {
    if (1..=MAX_RESULT_LIMIT).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            name,
            value,
            min: 1,
            max: MAX_RESULT_LIMIT,
        })
    }
}

fn parse_value(name: &'static str, value: &str) -> Result<usize, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}
