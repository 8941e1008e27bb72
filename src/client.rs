use crate::config::RankerConfig;
use crate::error::{RelevanceError, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user turn carrying a text instruction followed by one image.
    #[must_use]
    pub fn user_with_image(text: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_url.into(),
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice.
    pub fn into_content(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(RelevanceError::EmptyResponse)
    }
}

/// Anything that can answer a list of chat messages with a single reply.
pub trait ChatModel {
    fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String>;
}

impl<T: ChatModel + ?Sized> ChatModel for &T {
    fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        (**self).complete(messages, max_tokens)
    }
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    config: RankerConfig,
}

fn retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}

impl OpenAiClient {
    pub fn new(config: RankerConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    fn backoff(&self, attempt: u32, retry_after: Option<f64>) -> Duration {
        #[allow(clippy::cast_possible_wrap)]
        let mut delay = (self.config.retry_base * 2.0_f64.powi(attempt as i32))
            .min(self.config.retry_max);
        if let Some(retry_after) = retry_after {
            delay = delay.max(retry_after.min(self.config.retry_max));
        }
        Duration::from_secs_f64(delay.max(0.0))
    }
}

impl ChatModel for OpenAiClient {
    fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens,
        };

        let mut attempt = 0;
        loop {
            debug!(attempt, max_tokens, "POST {}", self.config.base_url);
            let sent = self
                .http
                .post(&self.config.base_url)
                .bearer_auth(&self.config.api_key)
                .json(&request)
                .send();

            match sent {
                Ok(resp) if resp.status().is_success() => {
                    let body: ChatResponse = resp.json()?;
                    return body.into_content();
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let retry_after = parse_retry_after(resp.headers());
                    let body = resp.text().unwrap_or_default();
                    if attempt < self.config.max_retries && retryable(status) {
                        let delay = self.backoff(attempt, retry_after);
                        warn!(status, ?delay, "chat completion failed, retrying");
                        thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    return Err(RelevanceError::Api { status, body });
                }
                Err(e) if attempt < self.config.max_retries && (e.is_timeout() || e.is_connect()) => {
                    let delay = self.backoff(attempt, None);
                    warn!(error = %e, ?delay, "transport error, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
