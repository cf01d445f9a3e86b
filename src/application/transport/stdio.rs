use super::{ToolSummary, TransportClient, TransportError};
use crate::types::ContentItem;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Grace period after spawning before the first request is written. The
/// wire protocol has no readiness handshake, so a slow-starting child can
/// still miss the first request; callers must tolerate the resulting
/// empty response.
const STARTUP_GRACE: Duration = Duration::from_millis(500);

struct Channel {
    // Held so the child stays scoped to the adapter; kill_on_drop reaps it.
    _child: Child,
    writer: BufWriter<ChildStdin>,
    reader: Lines<BufReader<ChildStdout>>,
}

/// Subprocess transport adapter. Spawns the gateway as a child process and
/// frames every call as one newline-terminated JSON-RPC request line on
/// its stdin, answered by exactly one line on its stdout.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    channel: Option<Channel>,
    next_id: u64,
}

impl StdioTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            channel: None,
            next_id: 1,
        }
    }

    /// One write, one read. Transport-level failures after connect are
    /// absorbed into `None` (logged at warn) rather than surfaced; this
    /// leniency is part of the adapter's contract.
    async fn roundtrip(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Option<Value>, TransportError> {
        let id = self.next_id;
        self.next_id += 1;
        let channel = self.channel.as_mut().ok_or(TransportError::NotConnected)?;

        let mut request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
        });
        if let Some(params) = params {
            request["params"] = params;
        }
        let mut line = request.to_string();
        line.push('\n');

        if let Err(error) = channel.writer.write_all(line.as_bytes()).await {
            warn!(method, %error, "Failed to write request to child; treating as empty result");
            return Ok(None);
        }
        if let Err(error) = channel.writer.flush().await {
            warn!(method, %error, "Failed to flush request to child; treating as empty result");
            return Ok(None);
        }

        let response = match channel.reader.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => line,
            Ok(_) => {
                debug!(method, "Child produced no output line; treating as empty result");
                return Ok(None);
            }
            Err(error) => {
                warn!(method, %error, "Failed to read response from child; treating as empty result");
                return Ok(None);
            }
        };

        match serde_json::from_str::<Value>(&response) {
            Ok(value) => match value.get("result") {
                Some(result) => Ok(Some(result.clone())),
                None => {
                    warn!(method, "Child response carried no result field; treating as empty result");
                    Ok(None)
                }
            },
            Err(error) => {
                warn!(method, %error, "Child response was not valid JSON; treating as empty result");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl TransportClient for StdioTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.channel.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                TransportError::connection(format!(
                    "failed to spawn '{}': {source}",
                    self.command
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::connection("failed to capture child stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::connection("failed to capture child stdout"))?;

        info!(command = self.command.as_str(), "Spawned gateway child process");
        tokio::time::sleep(STARTUP_GRACE).await;

        self.channel = Some(Channel {
            _child: child,
            writer: BufWriter::new(stdin),
            reader: BufReader::new(stdout).lines(),
        });
        Ok(())
    }

    async fn list_tools(&mut self) -> Result<Vec<ToolSummary>, TransportError> {
        let result = match self.roundtrip("mcp.listTools", None).await? {
            Some(result) => result,
            None => return Ok(Vec::new()),
        };
        match result.get("tools") {
            Some(tools) => match serde_json::from_value::<Vec<ToolSummary>>(tools.clone()) {
                Ok(tools) => Ok(tools),
                Err(error) => {
                    warn!(%error, "Malformed tools array in listTools response");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    async fn invoke_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Vec<ContentItem>, TransportError> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = match self.roundtrip("mcp.callTool", Some(params)).await? {
            Some(result) => result,
            None => return Ok(Vec::new()),
        };
        match result.get("content") {
            Some(content) => match serde_json::from_value::<Vec<ContentItem>>(content.clone()) {
                Ok(items) => Ok(items),
                Err(error) => {
                    warn!(tool = name, %error, "Malformed content array in callTool response");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_before_connect_fail_with_not_connected() {
        let mut transport = StdioTransport::new("true", Vec::new());
        let error = transport.list_tools().await.expect_err("not connected yet");
        assert!(matches!(error, TransportError::NotConnected));

        let error = transport
            .invoke_tool("todo.list", Map::new())
            .await
            .expect_err("not connected yet");
        assert!(matches!(error, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_connection_error() {
        let mut transport =
            StdioTransport::new("definitely-not-a-real-binary-4d7f", Vec::new());
        let error = transport.connect().await.expect_err("spawn fails");
        assert!(matches!(error, TransportError::Connection { .. }));
    }

    #[tokio::test]
    async fn silent_child_yields_empty_tool_list() {
        // The child reads the request and exits without answering.
        let mut transport = StdioTransport::new(
            "sh",
            vec!["-c".to_string(), "read _line; exit 0".to_string()],
        );
        transport.connect().await.expect("connect succeeds");
        let tools = transport.list_tools().await.expect("no error surfaces");
        assert!(tools.is_empty());
    }

    #[tokio::test]
    async fn non_json_output_yields_empty_result() {
        let mut transport = StdioTransport::new(
            "sh",
            vec![
                "-c".to_string(),
                "read _line; echo 'not json at all'".to_string(),
            ],
        );
        transport.connect().await.expect("connect succeeds");
        let items = transport
            .invoke_tool("echo.say", Map::new())
            .await
            .expect("no error surfaces");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn well_formed_response_is_parsed() {
        let script = r#"read _line; echo '{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"todo.list","description":"Get all todo items"}]}}'"#;
        let mut transport =
            StdioTransport::new("sh", vec!["-c".to_string(), script.to_string()]);
        transport.connect().await.expect("connect succeeds");

        let tools = transport.list_tools().await.expect("list succeeds");
        assert_eq!(
            tools,
            vec![ToolSummary::new("todo.list", "Get all todo items")]
        );
    }

    #[tokio::test]
    async fn call_tool_parses_content_items() {
        let script = r#"read _line; echo '{"jsonrpc":"2.0","id":1,"result":{"content":[{"type":"text","text":"hello"}]}}'"#;
        let mut transport =
            StdioTransport::new("sh", vec!["-c".to_string(), script.to_string()]);
        transport.connect().await.expect("connect succeeds");

        let items = transport
            .invoke_tool("echo.say", Map::new())
            .await
            .expect("invoke succeeds");
        assert_eq!(items, vec![ContentItem::text("hello")]);
    }
}
