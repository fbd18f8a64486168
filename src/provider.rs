//! Model Provider Client
//!
//! Thin client for a local text-completion service. Speaks the OpenAI-compatible
//! chat-completions protocol, which both Ollama (under `/v1`) and most local
//! inference servers expose. One call is one blocking round trip; retries are
//! the caller's business.

use crate::error::{GenerationError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:27b";

/// Which flavor of server sits behind `base_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Ollama; chat completions under `{base_url}/v1`, model listing at `/api/tags`
    Ollama,
    /// Any server whose `base_url` already points at an OpenAI-style `/v1` root
    OpenaiCompatible,
}

impl ProviderKind {
    pub fn slug(self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenaiCompatible => "openai-compatible",
        }
    }
}

/// Provider settings, loaded from the `[provider]` section of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_kind")]
    pub kind: ProviderKind,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model requested when the CLI does not name one
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Whole-request timeout in seconds; an elapsed timeout is a transport failure
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
}

fn default_kind() -> ProviderKind {
    ProviderKind::Ollama
}

fn default_base_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_tokens() -> Option<u32> {
    Some(500)
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "Base URL must start with http:// or https:// (got '{}')",
                self.base_url
            ));
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be at least one second".to_string());
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0 (got {})",
                    temperature
                ));
            }
        }
        Ok(())
    }

    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn chat_completions_url(&self) -> String {
        match self.kind {
            ProviderKind::Ollama => format!("{}/v1/chat/completions", self.root()),
            ProviderKind::OpenaiCompatible => format!("{}/chat/completions", self.root()),
        }
    }

    pub fn models_url(&self) -> String {
        match self.kind {
            ProviderKind::Ollama => format!("{}/api/tags", self.root()),
            ProviderKind::OpenaiCompatible => format!("{}/models", self.root()),
        }
    }
}

/// Completion client trait. The pipeline only ever needs a single text completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one (system, user) prompt pair and return the raw completion text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// Helper function to map HTTP errors to ProviderError
fn map_http_error(error: reqwest::Error) -> ProviderError {
    if let Some(status) = error.status() {
        ProviderError::Transport(format!("Request failed with status {}: {}", status, error))
    } else if error.is_timeout() {
        ProviderError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ProviderError::Transport(format!("Connection error: {}", error))
    } else {
        ProviderError::Transport(format!("HTTP error: {}", error))
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_provider_http_client(timeout: Duration) -> Result<Client, GenerationError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Chat-completions client for Ollama and OpenAI-compatible local servers.
pub struct ChatCompletionClient {
    client: Client,
    config: ProviderConfig,
}

impl ChatCompletionClient {
    pub fn new(config: ProviderConfig) -> Result<Self, GenerationError> {
        config.validate().map_err(GenerationError::Config)?;
        let client = build_provider_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    /// List models available on the provider.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = self.config.models_url();
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Transport(format!(
                "Failed to list models: status {} - {}",
                status, error_text
            )));
        }

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<TagInfo>,
        }
        #[derive(Deserialize)]
        struct TagInfo {
            name: String,
        }
        #[derive(Deserialize)]
        struct ModelsResponse {
            data: Vec<ModelInfo>,
        }
        #[derive(Deserialize)]
        struct ModelInfo {
            id: String,
        }

        match self.config.kind {
            ProviderKind::Ollama => {
                let tags: TagsResponse = response.json().await.map_err(|e| {
                    ProviderError::Transport(format!("Failed to parse models response: {}", e))
                })?;
                Ok(tags.models.into_iter().map(|m| m.name).collect())
            }
            ProviderKind::OpenaiCompatible => {
                let models: ModelsResponse = response.json().await.map_err(|e| {
                    ProviderError::Transport(format!("Failed to parse models response: {}", e))
                })?;
                Ok(models.data.into_iter().map(|m| m.id).collect())
            }
        }
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: MessageRole::System,
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: MessageRole::User,
                    content: user_prompt.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let url = self.config.chat_completions_url();
        tracing::debug!(url = %url, model = model, "Sending completion request");
        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Transport(format!(
                "Request failed with status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ProviderError::Transport(format!("Failed to parse response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }

    fn provider_name(&self) -> &str {
        self.config.kind.slug()
    }
}
