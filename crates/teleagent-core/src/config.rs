use std::path::Path;

use serde::{Deserialize, Serialize};
use teleagent_llm::backends::openai_compatible::{
    DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECONDS,
};

use crate::prompt::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_MAX_STEPS: usize = 6;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.65;
pub const DEFAULT_LOOP_LIMIT_MESSAGE: &str =
    "I could not complete this request right now. Please try again or contact customer support.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for the chat and embedding endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Non-terminal cycles allowed per user turn.
    pub max_steps: usize,
    /// Reply used when the step guardrail trips.
    pub loop_limit_message: String,
    /// Template with `{tool_names}` and `{tools}` placeholders.
    pub system_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            loop_limit_message: DEFAULT_LOOP_LIMIT_MESSAGE.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiSettings {
    pub similarity_threshold: f32,
}

impl Default for KpiSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Runtime settings, passed explicitly to every component that needs them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub kpi: KpiSettings,
}

impl Settings {
    /// Load settings from an optional TOML file, then apply `TELEAGENT_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TELEAGENT_BASE_URL") {
            self.model.base_url = value;
        }
        if let Some(value) = lookup("TELEAGENT_API_KEY") {
            self.model.api_key = Some(value).filter(|v| !v.is_empty());
        }
        if let Some(value) = lookup("TELEAGENT_MODEL") {
            self.model.model = value;
        }
        if let Some(value) = lookup("TELEAGENT_EMBEDDING_MODEL") {
            self.model.embedding_model = value;
        }
        if let Some(value) = lookup("TELEAGENT_MAX_STEPS") {
            self.agent.max_steps = parse_env("TELEAGENT_MAX_STEPS", &value)?;
        }
        if let Some(value) = lookup("TELEAGENT_SIMILARITY_THRESHOLD") {
            self.kpi.similarity_threshold = parse_env("TELEAGENT_SIMILARITY_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("TELEAGENT_TEMPERATURE") {
            self.model.temperature = parse_env("TELEAGENT_TEMPERATURE", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_steps == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_steps must be at least 1".to_string(),
            ));
        }

        let threshold = self.kpi.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "kpi.similarity_threshold must be within [-1, 1], got {threshold}"
            )));
        }

        if self.model.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "model.base_url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
