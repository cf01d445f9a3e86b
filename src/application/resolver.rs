use crate::catalog::ToolCatalog;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::model::{ModelError, ModelProvider, ModelRequest};
use crate::types::{ChatMessage, ContentItem, MessageRole, ToolDescriptor};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Pinned so that a fixed query keeps selecting the same tool.
const RESOLVER_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("intent resolution timed out after {waited:?}")]
    Timeout { waited: Duration },
    #[error("intent model unavailable: {0}")]
    Unavailable(#[from] ModelError),
    #[error("could not parse a tool call from the model answer")]
    Unparsable {
        /// Raw model output, kept for diagnostics.
        raw: String,
    },
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ResolveError {
    pub fn user_message(&self) -> String {
        match self {
            ResolveError::Timeout { waited } => format!(
                "The request to the language model timed out after {} seconds.",
                waited.as_secs()
            ),
            ResolveError::Unavailable(err) => err.user_message(),
            ResolveError::Unparsable { .. } => {
                "The language model did not produce a usable tool call.".to_string()
            }
            ResolveError::Dispatch(err) => err.user_message(),
        }
    }
}

/// A single structured tool call proposed by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub tool: String,
    pub params: Map<String, Value>,
}

/// Bridges free-text queries to the dispatcher: embeds the catalog into a
/// system prompt, asks the model for exactly one `{"tool", "params"}`
/// object, and forwards the parsed call. Resolution failures are always
/// structured errors; this layer never degrades to an empty result.
pub struct IntentResolver<P: ModelProvider> {
    provider: Arc<P>,
    model: String,
    timeout: Duration,
}

impl<P: ModelProvider> IntentResolver<P> {
    pub fn new(provider: Arc<P>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout,
        }
    }

    pub async fn resolve(
        &self,
        query: &str,
        catalog: &ToolCatalog,
    ) -> Result<ResolvedCall, ResolveError> {
        let request = ModelRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new(MessageRole::System, system_prompt(&catalog.list())),
                ChatMessage::new(MessageRole::User, query),
            ],
            temperature: RESOLVER_TEMPERATURE,
        };

        debug!(model = self.model.as_str(), "Submitting intent query to model");
        let response = tokio::time::timeout(self.timeout, self.provider.chat(request))
            .await
            .map_err(|_| {
                warn!(waited = ?self.timeout, "Intent model call timed out");
                ResolveError::Timeout {
                    waited: self.timeout,
                }
            })??;

        let call = parse_tool_call(&response.message.content)?;
        info!(tool = call.tool.as_str(), "Resolved query to tool call");
        Ok(call)
    }

    /// Resolve the query and run the proposed call through the dispatcher.
    pub async fn answer(
        &self,
        query: &str,
        dispatcher: &Dispatcher,
    ) -> Result<Vec<ContentItem>, ResolveError> {
        let call = self.resolve(query, dispatcher.catalog()).await?;
        let items = dispatcher.invoke(&call.tool, &call.params).await?;
        Ok(items)
    }
}

fn system_prompt(tools: &[Arc<ToolDescriptor>]) -> String {
    let mut listing = String::new();
    for tool in tools {
        let parameters = tool
            .parameters
            .iter()
            .map(|parameter| {
                let mut entry = format!("{}: {}", parameter.name, parameter.kind.as_str());
                if parameter.required {
                    entry.push_str(" (required)");
                }
                entry
            })
            .collect::<Vec<_>>()
            .join(", ");
        listing.push_str(&format!(
            "- {}: {}\n  Parameters: {}\n",
            tool.name, tool.description, parameters
        ));
    }

    format!(
        r#"You are an assistant that helps users interact with a set of tools through natural language.
Your job is to understand the user's request and determine which tool to call with what parameters.

Available tools:
{listing}
For each user request, respond ONLY with a JSON object in the following format:
{{
  "tool": "toolName",
  "params": {{
    "paramName1": "paramValue1"
  }}
}}

Do not include any explanations or any other text outside of the JSON. The JSON must be valid and match exactly the required tool parameters."#
    )
}

/// Strip a leading markdown fence (with or without a language tag) and a
/// trailing fence. Anything else is left untouched.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_tool_call(content: &str) -> Result<ResolvedCall, ResolveError> {
    let unparsable = || ResolveError::Unparsable {
        raw: content.to_string(),
    };

    let value: Value = serde_json::from_str(strip_fences(content)).map_err(|_| unparsable())?;
    let tool = value
        .get("tool")
        .and_then(Value::as_str)
        .filter(|tool| !tool.is_empty())
        .ok_or_else(unparsable)?;
    let params = value
        .get("params")
        .and_then(Value::as_object)
        .ok_or_else(unparsable)?;

    Ok(ResolvedCall {
        tool: tool.to_string(),
        params: params.clone(),
    })
}
