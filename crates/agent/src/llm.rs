use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tourbook_core::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion provider is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("response parsing failed: {0}")]
    ResponseParseFailed(String),
    #[error("rate limited by completion provider")]
    RateLimited,
    #[error("unauthorized: check the llm api key")]
    Unauthorized,
    #[error("api error (status {status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("completion contained no choices")]
    EmptyResponse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: Some(content.into()), tool_calls: Vec::new(), tool_call_id: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as the protocol sends it.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionSpec,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: &'static str, description: &'static str, parameters: Value) -> Self {
        Self { kind: "function", function: FunctionSpec { name, description, parameters } }
    }
}

fn function_kind() -> String {
    "function".to_owned()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl CompletionResponse {
    pub fn into_message(self) -> Result<ChatMessage, LlmError> {
        self.choices.into_iter().next().map(|choice| choice.message).ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, LlmError>;
}

/// Client for `/chat/completions` endpoints: OpenAI itself, or Ollama's
/// compatible API.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: Option<SecretString>,
    api_url: String,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if !config.is_enabled() {
            return Err(LlmError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        Ok(Self { client, api_key: config.api_key.clone(), api_url: config.effective_base_url() })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .header("content-type", "application/json")
            .json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response =
            builder.send().await.map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<CompletionResponse>()
                .await
                .map_err(|e| LlmError::ResponseParseFailed(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(LlmError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(LlmError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(LlmError::ApiError { status: status.as_u16(), message: body })
            }
        }
    }
}
