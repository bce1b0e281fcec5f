// Configuration - .image-analyzer.json discovery, defaults and env overrides

use crate::analysis::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE: &str = ".image-analyzer.json";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerConfig {
    /// Gemini model to send requests to
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the Generative Language API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Keep going after a failed image instead of aborting the batch
    #[serde(default)]
    pub keep_going: bool,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
            keep_going: false,
        }
    }
}

impl AnalyzerConfig {
    /// Load from the first config file found, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match find_config() {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("no {} found, using defaults", CONFIG_FILE);
                Self::default()
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write an example config; refuses to overwrite an existing file
    pub fn write_example(path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let json = serde_json::to_string_pretty(&Self::default())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.is_empty()) {
            self.model = model;
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::BestEffort
        } else {
            FailurePolicy::StopOnError
        }
    }
}

/// Look for a config in the current directory, then the home directory
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE))
        .filter(|path| path.exists())
}

/// Read the API key after loading `.env`, if one exists
pub fn api_key() -> Option<String> {
    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded .env from {}", path.display()),
        Err(e) => debug!(".env not loaded: {}", e),
    }

    let key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());
    if let Some(key) = &key {
        debug!("{} is set ({} chars)", API_KEY_VAR, key.len());
    }
    key
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
}
