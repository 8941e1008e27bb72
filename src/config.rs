use crate::error::{RelevanceError, Result};
use crate::utils::env_optional;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use std::{fs, io};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_DESCRIBE_PROMPT: &str = "Describe the image.";

/// Settings for talking to the chat-completions API and running the pipeline.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Seconds before the first retry; doubles every attempt.
    pub retry_base: f64,
    /// Upper bound in seconds for a single backoff delay.
    pub retry_max: f64,
    pub describe_prompt: String,
    /// Translate descriptions into the detected language of the text.
    pub translate: bool,
}

impl RankerConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_base: 0.5,
            retry_max: 8.0,
            describe_prompt: DEFAULT_DESCRIBE_PROMPT.to_string(),
            translate: true,
        }
    }

    /// Defaults overridden by `OPENAI_BASE_URL`, `OPENAI_MODEL` and `OPENAI_MAX_RETRIES`.
    pub fn from_env(api_key: impl Into<String>) -> Result<Self> {
        let mut config = Self::new(api_key);
        if let Some(url) = env_optional("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = env_optional("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(retries) = env_optional("OPENAI_MAX_RETRIES") {
            config.max_retries = retries
                .trim()
                .parse()
                .map_err(|_| RelevanceError::Config(format!("Invalid OPENAI_MAX_RETRIES: {retries}")))?;
        }
        Ok(config)
    }
}

/// Pick the API key from the command line, falling back to `OPENAI_API_KEY`.
pub fn resolve_api_key(flag: Option<&str>) -> Result<String> {
    flag.map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| env_optional("OPENAI_API_KEY").map(|key| key.trim().to_string()))
        .ok_or(RelevanceError::MissingApiKey)
}

/// Sits next to `model.onnx` as `embedder_config.json`. Every field is optional.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbedderConfig {
    pub max_length: usize,
    pub normalize: bool,
    pub pad_token: Option<String>,
    pub lowercase: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            max_length: 256,
            normalize: true,
            pad_token: None,
            lowercase: false,
        }
    }
}

impl EmbedderConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
