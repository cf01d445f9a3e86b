use crate::dispatch::Dispatcher;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize stdio response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

/// Child-process side of the subprocess wire protocol: one JSON-RPC
/// envelope per stdin line, one response line per request. Logging goes to
/// stderr (see `main`), so stdout carries nothing but protocol frames.
pub async fn run(dispatcher: Arc<Dispatcher>) -> Result<(), StdioError> {
    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received stdio request line");
        let response = respond(&dispatcher, &line).await;
        write_line(&mut stdout, &response).await?;
    }

    stdout.flush().await?;
    Ok(())
}

/// Build the response for one request line. Kept separate from the I/O
/// loop so the protocol surface can be exercised directly in tests.
pub async fn respond(dispatcher: &Dispatcher, line: &str) -> Value {
    let request: RpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(source) => {
            error!(%source, "Failed to parse stdio request line");
            return error_response(Value::Null, -32700, format!("parse error: {source}"));
        }
    };

    let id = request.id.clone().unwrap_or(Value::Null);
    if request.jsonrpc != "2.0" {
        return error_response(id, -32600, "unsupported jsonrpc version (expected 2.0)");
    }

    match request.method.as_str() {
        "mcp.listTools" => {
            let tools: Vec<Value> = dispatcher
                .catalog()
                .list()
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                    })
                })
                .collect();
            info!(count = tools.len(), "Serving mcp.listTools");
            json!({ "jsonrpc": "2.0", "id": id, "result": { "tools": tools } })
        }
        "mcp.callTool" => {
            let params = request.params.unwrap_or(Value::Null);
            let name = match params.get("name").and_then(Value::as_str) {
                Some(name) => name,
                None => {
                    return error_response(id, -32602, "callTool params require a 'name' field");
                }
            };
            let arguments = params
                .get("arguments")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            match dispatcher.invoke(name, &arguments).await {
                Ok(items) => {
                    json!({ "jsonrpc": "2.0", "id": id, "result": { "content": items } })
                }
                Err(err) => {
                    error!(tool = name, %err, "Tool invocation failed");
                    error_response(id, -32000, err.user_message())
                }
            }
        }
        other => {
            error!(method = other, "Unknown stdio method");
            error_response(id, -32601, format!("unknown method '{other}'"))
        }
    }
}

fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() },
    })
}

async fn write_line(stdout: &mut io::Stdout, response: &Value) -> Result<(), StdioError> {
    let mut payload = serde_json::to_vec(response)?;
    payload.push(b'\n');
    stdout.write_all(&payload).await?;
    stdout.flush().await?;
    Ok(())
}
