//! Completion provider port.
//!
//! A completion provider is the generative text model behind every
//! generation, reflection, correction and summary step. Different providers
//! speak different HTTP APIs (OpenAI-compatible chat, Anthropic Messages);
//! the repair loop only sees this trait.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatMessage, Completion};

/// Errors that can occur when calling a completion provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Retry limit reached after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl ProviderError {
    /// Errors worth retrying after a pause
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded(_)
                | Self::Timeout(_)
                | Self::ServerError { .. }
                | Self::NetworkError(_)
                | Self::MalformedResponse(_)
        )
    }

    /// Errors that will not go away by retrying
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Map an HTTP status and body into the matching variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AuthError(body),
            429 => Self::RateLimitExceeded(body),
            400 | 404 | 413 | 422 => Self::InvalidRequest(body),
            _ => Self::ServerError {
                status,
                message: body,
            },
        }
    }
}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => DomainError::Configuration(msg),
            other => DomainError::Provider(other.to_string()),
        }
    }
}

/// Port trait for completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider family name (e.g. "openai", "anthropic", "mock")
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent with
    fn model(&self) -> &str;

    /// Complete an ordered list of messages
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError>;
}

/// Factory that resolves model identifiers to providers
pub trait ProviderFactory: Send + Sync {
    /// Resolve a provider for a model identifier
    fn for_model(&self, model: &str) -> DomainResult<Arc<dyn CompletionProvider>>;

    /// Provider families this factory can construct
    fn available_families(&self) -> Vec<&'static str>;
}
