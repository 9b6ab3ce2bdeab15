//! Settings for the converter
//!
//! Settings are read once from a TOML or YAML file and handed to the
//! [`Converter`](crate::interfaces::Converter); nothing here is global.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::models::{Format, Scaffold};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Source format used when none is requested
    pub default_input: Format,
    /// Target format used when none is requested
    pub default_output: Format,
    /// `env_logger` filter applied when `RUST_LOG` is unset
    pub log_level: String,
    pub scaffold: Scaffold,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_input: Format::Txt,
            default_output: Format::ClashMeta,
            log_level: "info".to_string(),
            scaffold: Scaffold::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, choosing the parser by file extension.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        debug!("Loading settings from {}", path.display());
        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            _ => Self::load_from_content(&content),
        }
    }

    /// Load settings from text of unknown syntax: TOML first, then YAML.
    pub fn load_from_content(content: &str) -> Result<Self, SettingsError> {
        if toml::from_str::<toml::Value>(content).is_ok() {
            return Ok(toml::from_str(content)?);
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
