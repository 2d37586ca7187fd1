//! Mock completion provider for testing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::models::{ChatMessage, Completion};
use crate::domain::ports::{CompletionProvider, ProviderError};

/// Scripted provider: replies are served in order and every request is
/// recorded.
///
/// Once the script runs out the fallback reply is repeated; without a
/// fallback the call fails with [`ProviderError::InvalidRequest`].
pub struct MockProvider {
    model: String,
    script: Mutex<VecDeque<Result<Completion, ProviderError>>>,
    fallback: Option<Completion>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain-text reply.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_completion(Completion::text(text))
    }

    /// Queue a reply with usage information.
    pub fn with_completion(self, completion: Completion) -> Self {
        lock(&self.script).push_back(Ok(completion));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ProviderError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Reply served once the script is exhausted.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(Completion::text(text));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
        lock(&self.requests).push(messages.to_vec());

        let next = lock(&self.script).pop_front();
        match next {
            Some(reply) => reply,
            None => self.fallback.clone().ok_or_else(|| {
                ProviderError::InvalidRequest("mock provider script exhausted".to_string())
            }),
        }
    }
}
