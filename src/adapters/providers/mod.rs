//! Completion provider adapters.
//!
//! Each backend implements [`CompletionProvider`]; [`ProviderRegistry`]
//! selects the backend for a model identifier once, at configuration time,
//! and wraps it in the retry policy.
//!
//! [`CompletionProvider`]: crate::domain::ports::CompletionProvider

pub mod anthropic;
pub mod mock;
pub mod openai;
pub mod registry;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use mock::MockProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use registry::{ProviderFamily, ProviderRegistry, RetryingProvider};

use crate::domain::models::{ChatMessage, Role};
use crate::domain::ports::ProviderError;

/// Rewrite every `system` message as a `user` message.
///
/// Applied to the whole conversation before it reaches a backend that does
/// not accept system turns.
pub fn remap_system_to_user(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::System => ChatMessage::user(m.content.clone()),
            _ => m.clone(),
        })
        .collect()
}

/// Join consecutive messages that share a role, separated by a blank line.
pub fn merge_consecutive(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        match merged.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => merged.push(message),
        }
    }
    merged
}

/// Map a transport failure to a provider error.
pub(crate) fn transport_error(err: &reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::NetworkError(err.to_string())
    }
}
