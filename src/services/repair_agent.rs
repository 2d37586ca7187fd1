//! Repair agent.
//!
//! Wraps the completion providers used by a repair session, one per role:
//!
//! - initial generation from the specification;
//! - reviewer, which reflects on a failing verification;
//! - generator, which returns a corrected artifact;
//! - summarizer, which condenses an attempt for in-context history (opt-in).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::instrument;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ChatMessage, Config, FailureClass, Problem, RepairStrategy, TokenUsage,
};
use crate::domain::ports::{CompletionProvider, ProviderFactory};

use super::prompts::PromptSet;

pub struct RepairAgent {
    prompts: PromptSet,
    init_gen: Arc<dyn CompletionProvider>,
    reviewer: Arc<dyn CompletionProvider>,
    correction: Arc<dyn CompletionProvider>,
    summary: Option<Arc<dyn CompletionProvider>>,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

impl RepairAgent {
    pub fn new(
        prompts: PromptSet,
        init_gen: Arc<dyn CompletionProvider>,
        reviewer: Arc<dyn CompletionProvider>,
        correction: Arc<dyn CompletionProvider>,
        summary: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        Self {
            prompts,
            init_gen,
            reviewer,
            correction,
            summary,
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
        }
    }

    /// Resolve every role's provider through `factory`.
    ///
    /// Fails with a configuration error when a model is unknown, its
    /// credentials are missing, or a prompt template cannot be read.
    pub fn from_config(config: &Config, factory: &dyn ProviderFactory) -> DomainResult<Self> {
        let with_summary = config.history.use_llm_summary;
        let prompts = PromptSet::load(&config.prompts, with_summary)?;
        let summary = if with_summary {
            Some(factory.for_model(&config.models.summary)?)
        } else {
            None
        };

        Ok(Self::new(
            prompts,
            factory.for_model(&config.models.init_gen)?,
            factory.for_model(&config.models.reviewer)?,
            factory.for_model(&config.models.correction)?,
            summary,
        ))
    }

    /// Tokens consumed by every completion made through this agent.
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }

    async fn complete(
        &self,
        provider: &dyn CompletionProvider,
        role: &'static str,
        messages: &[ChatMessage],
    ) -> DomainResult<String> {
        let completion = provider.complete(messages).await?;
        if let Some(usage) = completion.usage {
            self.input_tokens.fetch_add(usage.input_tokens, Ordering::Relaxed);
            self.output_tokens.fetch_add(usage.output_tokens, Ordering::Relaxed);
        }
        tracing::debug!(
            role,
            provider = provider.name(),
            model = provider.model(),
            response_len = completion.text.len(),
            "Completion received"
        );
        Ok(completion.text)
    }

    /// Generate the first candidate from the specification.
    #[instrument(skip_all, fields(problem_id = %problem.id))]
    pub async fn generate(&self, problem: &Problem) -> DomainResult<String> {
        let messages = [
            ChatMessage::system(&self.prompts.init_gen),
            ChatMessage::user(&problem.specification),
        ];
        self.complete(self.init_gen.as_ref(), "init_gen", &messages).await
    }

    /// Ask the reviewer to reflect on a failing verification.
    #[instrument(skip_all, fields(failure_class = %class))]
    pub async fn reflect(&self, class: FailureClass, feedback: &str) -> DomainResult<String> {
        let messages = [
            ChatMessage::system(self.prompts.reflection_for(class)?),
            ChatMessage::user(feedback),
        ];
        self.complete(self.reviewer.as_ref(), "reviewer", &messages).await
    }

    /// Ask the generator for a corrected candidate.
    #[instrument(skip_all, fields(strategy = strategy.try_kind()))]
    pub async fn correct(
        &self,
        strategy: RepairStrategy,
        specification: &str,
        in_context_history: Option<&str>,
        feedback: &str,
        reviewer_response: &str,
    ) -> DomainResult<String> {
        let mut messages = vec![
            ChatMessage::system(self.prompts.correction_for(strategy)),
            ChatMessage::user(specification),
        ];
        if let Some(history) = in_context_history {
            messages.push(ChatMessage::user(history));
        }
        messages.push(ChatMessage::user(feedback));
        messages.push(ChatMessage::user(reviewer_response));

        self.complete(self.correction.as_ref(), "correction", &messages).await
    }

    /// Condense an attempt; `None` when summaries are disabled.
    pub async fn summarize(
        &self,
        feedback: &str,
        reviewer_response: &str,
    ) -> DomainResult<Option<String>> {
        let (Some(provider), Some(prompt)) = (&self.summary, &self.prompts.attempt_summary) else {
            return Ok(None);
        };
        let messages = [
            ChatMessage::system(prompt),
            ChatMessage::user(feedback),
            ChatMessage::user(format!("# Reviewer Response:\n\n{reviewer_response}")),
        ];
        self.complete(provider.as_ref(), "summary", &messages).await.map(Some)
    }
}
