mod http;
mod stdio;

use crate::types::ContentItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use http::{HeartbeatMonitor, HttpTransport};
pub use stdio::StdioTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {message}")]
    Connection { message: String },
    #[error("transport not connected; call connect() first")]
    NotConnected,
}

impl TransportError {
    pub fn connection(message: impl Into<String>) -> Self {
        TransportError::Connection {
            message: message.into(),
        }
    }
}

/// Name and description of a tool as reported to clients. The parameter
/// schema stays server-side; clients only need enough to pick a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ToolSummary {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Abstract client contract spoken by every transport adapter. Adapters
/// share no state; a test double implementing this trait can stand in for
/// either real transport.
///
/// Calls are strictly sequential per adapter instance: one request, one
/// response, before the next request.
#[async_trait]
pub trait TransportClient: Send {
    /// Establish the channel. Safe to call once; every other method fails
    /// with [`TransportError::NotConnected`] until it has succeeded.
    async fn connect(&mut self) -> Result<(), TransportError>;

    async fn list_tools(&mut self) -> Result<Vec<ToolSummary>, TransportError>;

    async fn invoke_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Vec<ContentItem>, TransportError>;
}
