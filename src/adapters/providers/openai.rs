//! OpenAI-compatible chat completions provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use crate::domain::models::{ChatMessage, Completion, Role, TokenUsage};
use crate::domain::ports::{CompletionProvider, ProviderError};

use super::transport_error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (read from `OPENAI_API_KEY` if not set).
    pub api_key: Option<String>,
    /// Base URL; falls back to `OPENAI_API_ENDPOINT`, then `OPENAI_BASE_URL`.
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            temperature: None,
            timeout_secs: 300,
        }
    }
}

impl OpenAiConfig {
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .or_else(|| std::env::var("OPENAI_API_ENDPOINT").ok())
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Provider speaking the `/chat/completions` API.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiProvider {
    /// Create a provider; fails when no API key is available.
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .get_api_key()
            .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY not set".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: config.resolved_base_url(),
            api_key,
            config,
            client,
        })
    }

    fn build_request<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    content: &m.content,
                })
                .collect(),
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&self.build_request(messages))
            .send()
            .await
            .map_err(|e| transport_error(&e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::MalformedResponse(format!("Failed to parse response: {e}"))
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::MalformedResponse("response has no choices".to_string())
            })?;

        Ok(Completion {
            text,
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_prefers_config_then_environment() {
        temp_env::with_vars(
            [
                ("OPENAI_API_ENDPOINT", Some("https://proxy.example/v1/")),
                ("OPENAI_BASE_URL", Some("https://other.example/v1")),
            ],
            || {
                assert_eq!(
                    OpenAiConfig::default().resolved_base_url(),
                    "https://proxy.example/v1"
                );
                assert_eq!(
                    OpenAiConfig::default()
                        .with_base_url("http://localhost:8000/v1")
                        .resolved_base_url(),
                    "http://localhost:8000/v1"
                );
            },
        );
        temp_env::with_vars(
            [
                ("OPENAI_API_ENDPOINT", None::<&str>),
                ("OPENAI_BASE_URL", None),
            ],
            || {
                assert_eq!(OpenAiConfig::default().resolved_base_url(), DEFAULT_OPENAI_BASE_URL);
            },
        );
    }

    #[test]
    fn missing_key_is_not_configured() {
        temp_env::with_var("OPENAI_API_KEY", None::<&str>, || {
            let err = OpenAiProvider::new(OpenAiConfig::default()).err().unwrap();
            assert!(matches!(err, ProviderError::NotConfigured(_)));
        });
    }

    #[test]
    fn request_keeps_roles() {
        let provider = OpenAiProvider::new(OpenAiConfig::default().with_api_key("k")).unwrap();
        let messages = [ChatMessage::system("sys"), ChatMessage::user("spec")];
        let json = serde_json::to_value(provider.build_request(&messages)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "spec");
        assert!(json.get("temperature").is_none());
    }
}
