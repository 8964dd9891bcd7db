//! OpenAI-compatible `/chat/completions` backend.
//!
//! Serves both OpenAI and local servers that speak the same protocol
//! (Ollama exposes it under `/v1`). Requests are async `reqwest` calls
//! driven to completion on an owned runtime, so callers stay synchronous.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{OracleError, OracleResult};
use super::model::{ChatMessage, ChatModel};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

pub struct OpenAiChatModel {
    client: Client,
    runtime: tokio::runtime::Runtime,
    label: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
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
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiOptions {
    pub label: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl OpenAiChatModel {
    pub fn new(options: OpenAiOptions) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| OracleError::Transport(format!("Failed to create HTTP client: {e}")))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| OracleError::Transport(format!("Failed to start async runtime: {e}")))?;

        Ok(Self {
            client,
            runtime,
            label: options.label,
            endpoint: format!("{}/chat/completions", options.base_url.trim_end_matches('/')),
            model: options.model,
            api_key: options.api_key,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        })
    }

    async fn request(&self, messages: &[ChatMessage]) -> OracleResult<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| OracleError::Transport(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ApiError>(&text)
                .map(|error| error.error.message)
                .unwrap_or(text);
            return Err(OracleError::Transport(format!("{} API error ({status}): {detail}", self.label)));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Transport(format!("Failed to parse response: {e}")))?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::Transport("Response contains no message".to_string()))
    }
}

impl ChatModel for OpenAiChatModel {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn complete(&self, messages: &[ChatMessage]) -> OracleResult<String> {
        self.runtime.block_on(self.request(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(base_url: &str) -> OpenAiOptions {
        OpenAiOptions {
            label: "ollama:qwen2".to_string(),
            base_url: base_url.to_string(),
            model: "qwen2".to_string(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 128,
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let model = OpenAiChatModel::new(options("http://localhost:11434/v1/")).unwrap();
        assert_eq!(model.endpoint, "http://localhost:11434/v1/chat/completions");
        assert_eq!(model.name(), "ollama:qwen2");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = [ChatMessage::user("hi")];
        let body = CompletionRequest {
            model: "gpt-4o",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 16,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 16);
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let model = OpenAiChatModel::new(options("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            model.complete(&[ChatMessage::user("hi")]),
            Err(OracleError::Transport(_))
        ));
    }
}
