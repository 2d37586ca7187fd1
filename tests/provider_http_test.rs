//! HTTP providers against a mock server.

use std::sync::Arc;

use mockito::{Matcher, Server};
use serde_json::json;

use rechisel::adapters::providers::{
    AnthropicConfig, AnthropicProvider, OpenAiConfig, OpenAiProvider, RetryingProvider,
};
use rechisel::domain::models::ChatMessage;
use rechisel::domain::ports::{CompletionProvider, ProviderError};
use rechisel::infrastructure::retry::RetryPolicy;

fn conversation() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are a Chisel expert."),
        ChatMessage::user("Implement an inverter."),
    ]
}

fn openai(url: String) -> OpenAiProvider {
    OpenAiProvider::new(
        OpenAiConfig::default()
            .with_api_key("test-key")
            .with_base_url(url)
            .with_model("gpt-4o"),
    )
    .expect("provider")
}

fn anthropic(url: String) -> AnthropicProvider {
    AnthropicProvider::new(
        AnthropicConfig::default()
            .with_api_key("test-key")
            .with_base_url(url)
            .with_model("claude-3-5-sonnet-latest"),
    )
    .expect("provider")
}

#[tokio::test]
async fn openai_sends_roles_and_reads_usage() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "You are a Chisel expert."},
                {"role": "user", "content": "Implement an inverter."}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "```scala\nclass A\n```"}
                }],
                "usage": {"prompt_tokens": 21, "completion_tokens": 7}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let completion = openai(server.url()).complete(&conversation()).await.unwrap();

    mock.assert_async().await;
    assert!(completion.text.contains("class A"));
    let usage = completion.usage.unwrap();
    assert_eq!(usage.input_tokens, 21);
    assert_eq!(usage.output_tokens, 7);
}

#[tokio::test]
async fn openai_status_codes_map_to_errors() {
    let mut server = Server::new_async().await;
    let _limited = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let err = openai(server.url()).complete(&conversation()).await.unwrap_err();
    assert!(matches!(err, ProviderError::RateLimitExceeded(ref body) if body == "slow down"));
    assert!(err.is_transient());
}

#[tokio::test]
async fn openai_without_choices_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(json!({"choices": []}).to_string())
        .create_async()
        .await;

    let err = openai(server.url()).complete(&conversation()).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)));
}

#[tokio::test]
async fn anthropic_folds_system_prompt_into_user_turn() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "model": "claude-3-5-sonnet-latest",
            "messages": [{
                "role": "user",
                "content": "You are a Chisel expert.\n\nImplement an inverter."
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "content": [
                    {"type": "text", "text": "first"},
                    {"type": "tool_use", "id": "x", "name": "y", "input": {}},
                    {"type": "text", "text": "second"}
                ],
                "usage": {"input_tokens": 12, "output_tokens": 3}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let completion = anthropic(server.url()).complete(&conversation()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(completion.text, "first\nsecond");
    assert_eq!(completion.usage.unwrap().total(), 15);
}

#[tokio::test]
async fn anthropic_request_has_no_system_field() {
    let mut server = Server::new_async().await;
    let with_system = server
        .mock("POST", "/v1/messages")
        .match_body(Matcher::Regex(r#""system""#.to_string()))
        .with_status(500)
        .expect(0)
        .create_async()
        .await;
    let _ok = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(json!({"content": [{"type": "text", "text": "ok"}]}).to_string())
        .create_async()
        .await;

    let completion = anthropic(server.url()).complete(&conversation()).await.unwrap();
    assert_eq!(completion.text, "ok");
    with_system.assert_async().await;
}

#[tokio::test]
async fn authentication_failure_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(401)
        .with_body("invalid x-api-key")
        .expect(1)
        .create_async()
        .await;

    let provider = RetryingProvider::new(
        Arc::new(anthropic(server.url())),
        RetryPolicy::new(3, 1),
    );
    let err = provider.complete(&conversation()).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ProviderError::AuthError(_)));
}

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .expect(3)
        .create_async()
        .await;

    let provider = RetryingProvider::new(Arc::new(openai(server.url())), RetryPolicy::new(3, 1));
    let err = provider.complete(&conversation()).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ProviderError::RetriesExhausted { attempts: 3, .. }));
}
