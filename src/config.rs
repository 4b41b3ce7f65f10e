// Configuration document: the same YAML schema the production chatbot
// reads (`gai_models`, `gai_prompt`, `first_consented_message` plus the
// optional conversation limits). Parsed into typed structs once at
// startup; anything malformed is rejected here, before any menu runs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Fallback context budget (in whitespace-separated words) for models
/// without a `max_tokens` entry.
pub const DEFAULT_MAX_TOKENS: u32 = 7000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config section `{key}` is missing or empty")]
    MissingSection { key: &'static str },
}

/// A parsed configuration document. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Platform name -> model identifiers offered on that platform.
    #[serde(default)]
    pub gai_models: BTreeMap<String, Vec<String>>,

    /// Prompt key -> system prompt template.
    #[serde(default)]
    pub gai_prompt: BTreeMap<String, String>,

    /// Message key -> opening message template.
    #[serde(default)]
    pub first_consented_message: BTreeMap<String, String>,

    /// Model identifier -> context budget in words.
    #[serde(default)]
    pub max_tokens: BTreeMap<String, u32>,

    /// Cap on USER turns per conversation. Absent means no limit.
    #[serde(default)]
    pub max_interactions: Option<u32>,

    /// Final assistant line appended when the interaction cap is hit.
    #[serde(default)]
    pub goodbye_message: Option<String>,
}

impl Config {
    /// Load and validate a configuration document.
    ///
    /// All three selection mappings must be present and non-empty; the
    /// error names the offending key so the config can be fixed without
    /// digging through a stack trace.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // `gai_models: {openai: []}` offers nothing to select either, so
        // check the flattened pairs rather than the outer mapping.
        if self.gai_models.values().all(|models| models.is_empty()) {
            return Err(ConfigError::MissingSection { key: "gai_models" });
        }
        if self.gai_prompt.is_empty() {
            return Err(ConfigError::MissingSection { key: "gai_prompt" });
        }
        if self.first_consented_message.is_empty() {
            return Err(ConfigError::MissingSection {
                key: "first_consented_message",
            });
        }
        Ok(())
    }

    /// Context budget for a model, falling back to [`DEFAULT_MAX_TOKENS`].
    pub fn max_tokens_for(&self, model: &str) -> u32 {
        self.max_tokens
            .get(model)
            .copied()
            .unwrap_or(DEFAULT_MAX_TOKENS)
    }
}
