//! Engine configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Precedence: JSON file, then `TEENCARE_*` environment variables, then
//! explicit CLI flags applied by the caller.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AssessmentError;
use crate::triage::policy::DEFAULT_CLOSING_DEPTH;

pub const ENV_MODEL_URL: &str = "TEENCARE_MODEL_URL";
pub const ENV_MODEL_NAME: &str = "TEENCARE_MODEL_NAME";
pub const ENV_MODEL_TIMEOUT: &str = "TEENCARE_MODEL_TIMEOUT_SECS";

const DEFAULT_MODEL_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL_NAME: &str = "llama3.2";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the conversational model and the fallback policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether to use the conversational model at all
    pub model_enabled: bool,
    /// Base URL of the Ollama-compatible endpoint
    pub model_url: String,
    /// Model name passed to the endpoint
    pub model_name: String,
    /// Per-request time budget; a timeout only affects the current turn
    pub request_timeout_secs: u64,
    /// Assistant depth after which the fallback policy closes the conversation
    pub closing_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_enabled: false,
            model_url: DEFAULT_MODEL_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            closing_depth: DEFAULT_CLOSING_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, AssessmentError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| AssessmentError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AssessmentError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Apply `TEENCARE_*` environment variables
    pub fn with_env_overrides(self) -> Result<Self, AssessmentError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Setting a model URL enables the model.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, AssessmentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_MODEL_URL).filter(|v| !v.trim().is_empty()) {
            self.model_url = url.trim().to_string();
            self.model_enabled = true;
        }
        if let Some(name) = lookup(ENV_MODEL_NAME).filter(|v| !v.trim().is_empty()) {
            self.model_name = name.trim().to_string();
        }
        if let Some(timeout) = lookup(ENV_MODEL_TIMEOUT) {
            self.request_timeout_secs = timeout.trim().parse().map_err(|_| {
                AssessmentError::ConfigError(format!("{} must be an integer: {}", ENV_MODEL_TIMEOUT, timeout))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.request_timeout_secs == 0 {
            return Err(AssessmentError::ConfigError(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(self.model_url.starts_with("http://") || self.model_url.starts_with("https://")) {
            return Err(AssessmentError::ConfigError(format!(
                "model_url must be an http(s) URL: {}",
                self.model_url
            )));
        }
        if self.model_name.trim().is_empty() {
            return Err(AssessmentError::ConfigError("model_name must not be empty".to_string()));
        }
        Ok(())
    }
}
