use crate::types::{ChatMessage, MessageRole};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature. The intent resolver pins this low so tool
    /// selection stays stable for a fixed query.
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: ChatMessage,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("model provider returned invalid response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    pub fn user_message(&self) -> String {
        match self {
            ModelError::Network(err) => {
                if err.is_connect() {
                    "Could not reach the language model service. Check that the Ollama server is running and reachable.".to_string()
                } else if err.is_timeout() {
                    "The language model request timed out. Try again shortly.".to_string()
                } else if let Some(status) = err.status() {
                    match status {
                        StatusCode::NOT_FOUND => {
                            "Model endpoint not found (404). Check that the Ollama server exposes /api/chat.".to_string()
                        }
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                            "The language model service is currently unavailable. Try again later.".to_string()
                        }
                        _ => format!(
                            "The language model request failed with status {}.",
                            status.as_u16()
                        ),
                    }
                } else {
                    "A network error occurred while contacting the language model service.".to_string()
                }
            }
            ModelError::InvalidResponse(_) => {
                "The language model returned a response that could not be processed.".to_string()
            }
        }
    }
}

/// Opaque chat-completion backend. The resolver only ever needs one turn:
/// a system prompt, the user query, one answer.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}

#[derive(Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            http: client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{trimmed}/{path}")
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.endpoint("/api/chat");
        let payload = OllamaChatRequest::from(&request);
        info!(
            model = request.model.as_str(),
            url = %url,
            messages = request.messages.len(),
            "Sending request to model provider"
        );
        let response: OllamaChatResponse = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("Received response from model provider");

        let message = response
            .message
            .ok_or_else(|| ModelError::InvalidResponse("missing message field".into()))?;

        let role = MessageRole::from_str(message.role.as_str())
            .ok_or_else(|| ModelError::InvalidResponse("unknown role in response".into()))?;

        Ok(ModelResponse {
            message: ChatMessage::new(role, message.content),
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

impl From<&ModelRequest> for OllamaChatRequest {
    fn from(value: &ModelRequest) -> Self {
        Self {
            model: value.model.clone(),
            messages: value
                .messages
                .iter()
                .map(|msg| OllamaChatMessage {
                    role: msg.role.as_str().to_string(),
                    content: msg.content.clone(),
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: value.temperature,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaChatMessage>,
}
