//! Chat-completions client against a local fake provider.

use super::test_utils::{chat_response, FakeProvider};
use issuegen::error::ProviderError;
use issuegen::provider::{ChatCompletionClient, CompletionClient, ProviderConfig, ProviderKind};

fn config(base_url: &str, kind: ProviderKind) -> ProviderConfig {
    ProviderConfig {
        kind,
        base_url: base_url.to_string(),
        model: "gemma3:27b".to_string(),
        api_key: None,
        timeout_secs: 5,
        temperature: Some(0.3),
        max_tokens: Some(200),
    }
}

#[tokio::test]
async fn test_completion_round_trip_against_ollama() {
    let server = FakeProvider::start(|_, _| (200, chat_response("Email login")));
    let client = ChatCompletionClient::new(config(&server.base_url, ProviderKind::Ollama)).unwrap();

    let text = client
        .complete("You write stories.", "Write a title.", "llama3")
        .await
        .unwrap();
    assert_eq!(text, "Email login");
    assert_eq!(client.provider_name(), "ollama");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/v1/chat/completions");
    assert!(requests[0].header("authorization").is_none());

    let body = requests[0].json();
    assert_eq!(body["model"], "llama3");
    assert_eq!(body["stream"], false);
    assert_eq!(body["max_tokens"], 200);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You write stories.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Write a title.");
}

#[tokio::test]
async fn test_openai_compatible_path_and_bearer_key() {
    let server = FakeProvider::start(|_, _| (200, chat_response("ok")));
    let mut settings = config(&format!("{}/v1/", server.base_url), ProviderKind::OpenaiCompatible);
    settings.api_key = Some("sk-local".to_string());
    let client = ChatCompletionClient::new(settings).unwrap();

    client.complete("s", "u", "m").await.unwrap();
    let requests = server.requests();
    assert_eq!(requests[0].path, "/v1/chat/completions");
    assert_eq!(requests[0].header("authorization"), Some("Bearer sk-local"));
}

#[tokio::test]
async fn test_blank_content_is_empty_response() {
    let server = FakeProvider::start(|_, _| (200, chat_response("  \n ")));
    let client = ChatCompletionClient::new(config(&server.base_url, ProviderKind::Ollama)).unwrap();
    assert_eq!(
        client.complete("s", "u", "m").await,
        Err(ProviderError::EmptyResponse)
    );
}

#[tokio::test]
async fn test_error_status_and_bad_body_are_transport_errors() {
    let server = FakeProvider::start(|index, _| match index {
        0 => (500, r#"{"error":"model not loaded"}"#.to_string()),
        _ => (200, "not json".to_string()),
    });
    let client = ChatCompletionClient::new(config(&server.base_url, ProviderKind::Ollama)).unwrap();

    match client.complete("s", "u", "m").await {
        Err(ProviderError::Transport(message)) => assert!(message.contains("500"), "{}", message),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert!(matches!(
        client.complete("s", "u", "m").await,
        Err(ProviderError::Transport(_))
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let client =
        ChatCompletionClient::new(config(&format!("http://{}", address), ProviderKind::Ollama)).unwrap();
    assert!(matches!(
        client.complete("s", "u", "m").await,
        Err(ProviderError::Transport(_))
    ));
}

#[tokio::test]
async fn test_list_models_per_provider_kind() {
    let ollama = FakeProvider::start(|_, _| {
        (
            200,
            r#"{"models":[{"name":"gemma3:27b"},{"name":"llama3:8b"}]}"#.to_string(),
        )
    });
    let client = ChatCompletionClient::new(config(&ollama.base_url, ProviderKind::Ollama)).unwrap();
    assert_eq!(
        client.list_models().await.unwrap(),
        vec!["gemma3:27b".to_string(), "llama3:8b".to_string()]
    );
    assert_eq!(ollama.requests()[0].path, "/api/tags");

    let compatible = FakeProvider::start(|_, _| {
        (200, r#"{"object":"list","data":[{"id":"qwen2.5"}]}"#.to_string())
    });
    let client = ChatCompletionClient::new(config(
        &format!("{}/v1", compatible.base_url),
        ProviderKind::OpenaiCompatible,
    ))
    .unwrap();
    assert_eq!(client.list_models().await.unwrap(), vec!["qwen2.5".to_string()]);
    assert_eq!(compatible.requests()[0].path, "/v1/models");
}
