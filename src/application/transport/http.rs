use super::{ToolSummary, TransportClient, TransportError};
use crate::types::ContentItem;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Known server-side catalog. This adapter does not discover tools from
/// the server; the list is maintained by hand against the gateway's
/// registration tables. A deliberate trust/scope limitation, not an
/// oversight.
const KNOWN_TOOLS: [(&str, &str); 13] = [
    ("echo.say", "Echoes the message back to the caller"),
    ("echo.reverse", "Echoes the message back reversed"),
    ("todo.list", "Get all todo items"),
    ("todo.get", "Get a todo item by ID"),
    ("todo.create", "Create a new todo item"),
    ("todo.update", "Update an existing todo item"),
    ("todo.delete", "Delete a todo item"),
    ("incident.create", "Create a new ITSM incident"),
    ("incident.get", "Retrieve incident details"),
    ("incident.list", "Get all incidents"),
    ("incident.update", "Update an existing incident"),
    ("weather.get", "Get current weather for a location"),
    ("weather.forecast", "Get weather forecast for the next few days"),
];

/// HTTP transport adapter. Stateless between calls: each invocation is a
/// single POST of `{tool, params}` against the configured endpoint.
/// Failures after connect are absorbed into empty results and logged.
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
    connected: bool,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
            connected: false,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }
}

#[async_trait]
impl TransportClient for HttpTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        // No channel to establish; each call carries its own request.
        info!(endpoint = self.endpoint.as_str(), "Using HTTP gateway endpoint");
        self.connected = true;
        Ok(())
    }

    async fn list_tools(&mut self) -> Result<Vec<ToolSummary>, TransportError> {
        self.ensure_connected()?;
        Ok(KNOWN_TOOLS
            .iter()
            .map(|(name, description)| ToolSummary::new(*name, *description))
            .collect())
    }

    async fn invoke_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Vec<ContentItem>, TransportError> {
        self.ensure_connected()?;

        let body = json!({ "tool": name, "params": arguments });
        let response = match self.http.post(&self.endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(tool = name, %error, "Gateway request failed; treating as empty result");
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            warn!(
                tool = name,
                status = response.status().as_u16(),
                "Gateway returned non-success status; treating as empty result"
            );
            return Ok(Vec::new());
        }

        let payload = match response.json::<Value>().await {
            Ok(payload) => payload,
            Err(error) => {
                warn!(tool = name, %error, "Gateway response was not valid JSON; treating as empty result");
                return Ok(Vec::new());
            }
        };

        if let Some(result) = payload.get("result") {
            let text = match result {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return Ok(vec![ContentItem::text(text)]);
        }
        if let Some(error) = payload.get("error") {
            warn!(tool = name, %error, "Gateway returned an error payload");
        }
        Ok(Vec::new())
    }
}

/// Liveness monitor over the gateway's server-sent heartbeat stream. Runs
/// on its own task and only records when the last heartbeat arrived; it
/// carries no tool data. Dropping (or `stop`) aborts the task, which
/// closes the underlying connection.
pub struct HeartbeatMonitor {
    last_seen: Arc<Mutex<Option<DateTime<Utc>>>>,
    task: JoinHandle<()>,
}

impl HeartbeatMonitor {
    pub fn start(url: impl Into<String>) -> Self {
        let url = url.into();
        let last_seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&last_seen);
        let task = tokio::spawn(async move {
            let mut events = EventSource::get(&url);
            while let Some(event) = events.next().await {
                match event {
                    Ok(Event::Open) => debug!(url = url.as_str(), "Heartbeat stream opened"),
                    Ok(Event::Message(message)) => {
                        if let Some(stamp) = parse_heartbeat(&message.data) {
                            *slot.lock().expect("heartbeat slot lock") = Some(stamp);
                        }
                    }
                    Err(error) => {
                        warn!(url = url.as_str(), %error, "Heartbeat stream ended");
                        events.close();
                        break;
                    }
                }
            }
        });
        Self { last_seen, task }
    }

    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        *self.last_seen.lock().expect("heartbeat slot lock")
    }

    pub fn stop(self) {
        // Drop aborts the task.
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn parse_heartbeat(data: &str) -> Option<DateTime<Utc>> {
    let value: Value = serde_json::from_str(data).ok()?;
    if value.get("type").and_then(Value::as_str) != Some("heartbeat") {
        return None;
    }
    let stamp = value.get("timestamp").and_then(Value::as_str)?;
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|stamp| stamp.with_timezone(&Utc))
}
