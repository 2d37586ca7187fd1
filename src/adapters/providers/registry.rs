//! Provider registry and factory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatMessage, Completion, ProvidersConfig};
use crate::domain::ports::{CompletionProvider, ProviderError, ProviderFactory};
use crate::infrastructure::RetryPolicy;

use super::anthropic::{AnthropicConfig, AnthropicProvider};
use super::openai::{OpenAiConfig, OpenAiProvider};

/// Backend family a model identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
    Mock,
}

/// Model-name prefixes, checked in order.
const FAMILY_PREFIXES: &[(&str, ProviderFamily)] = &[
    ("gpt-", ProviderFamily::OpenAi),
    ("chatgpt-", ProviderFamily::OpenAi),
    ("o1", ProviderFamily::OpenAi),
    ("o3", ProviderFamily::OpenAi),
    ("o4", ProviderFamily::OpenAi),
    ("claude-", ProviderFamily::Anthropic),
    ("mock", ProviderFamily::Mock),
];

impl ProviderFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Mock => "mock",
        }
    }

    /// Look a model identifier up in the prefix table.
    pub fn for_model(model: &str) -> Option<Self> {
        FAMILY_PREFIXES
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map(|(_, family)| *family)
    }
}

/// Registry of available providers.
///
/// Explicitly registered providers (used by tests and embedders) take
/// precedence over the prefix table. Every provider handed out is wrapped in
/// a [`RetryingProvider`].
pub struct ProviderRegistry {
    config: ProvidersConfig,
    retry: RetryPolicy,
    registered: HashMap<String, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    pub fn new(config: ProvidersConfig, retry: RetryPolicy) -> Self {
        Self {
            config,
            retry,
            registered: HashMap::new(),
        }
    }

    /// Serve `provider` for the exact model identifier `model`.
    pub fn with_provider(
        mut self,
        model: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        self.registered.insert(model.into(), provider);
        self
    }

    fn create(&self, model: &str) -> DomainResult<Arc<dyn CompletionProvider>> {
        if let Some(provider) = self.registered.get(model) {
            return Ok(Arc::clone(provider));
        }

        let family = ProviderFamily::for_model(model).ok_or_else(|| {
            DomainError::Configuration(format!("No provider family for model `{model}`"))
        })?;

        let provider: Arc<dyn CompletionProvider> = match family {
            ProviderFamily::OpenAi => Arc::new(OpenAiProvider::new(OpenAiConfig {
                api_key: None,
                base_url: self.config.openai_base_url.clone(),
                model: model.to_string(),
                temperature: self.config.temperature,
                timeout_secs: self.config.timeout_secs,
            })?),
            ProviderFamily::Anthropic => Arc::new(AnthropicProvider::new(AnthropicConfig {
                api_key: None,
                base_url: self.config.anthropic_base_url.clone(),
                model: model.to_string(),
                api_version: self.config.anthropic_version.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                timeout_secs: self.config.timeout_secs,
            })?),
            ProviderFamily::Mock => {
                return Err(DomainError::Configuration(format!(
                    "Mock model `{model}` has no registered provider"
                )))
            }
        };
        Ok(provider)
    }
}

impl ProviderFactory for ProviderRegistry {
    fn for_model(&self, model: &str) -> DomainResult<Arc<dyn CompletionProvider>> {
        let inner = self.create(model)?;
        tracing::debug!(model, provider = inner.name(), "Resolved completion provider");
        Ok(Arc::new(RetryingProvider::new(inner, self.retry.clone())))
    }

    fn available_families(&self) -> Vec<&'static str> {
        vec![
            ProviderFamily::OpenAi.as_str(),
            ProviderFamily::Anthropic.as_str(),
            ProviderFamily::Mock.as_str(),
        ]
    }
}

/// Provider decorator applying a [`RetryPolicy`] to every call.
pub struct RetryingProvider {
    inner: Arc<dyn CompletionProvider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn CompletionProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl CompletionProvider for RetryingProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
        self.policy.execute(|| self.inner.complete(messages)).await
    }
}
