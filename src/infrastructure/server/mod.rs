use crate::dispatch::{DispatchError, Dispatcher};
use crate::model::ModelProvider;
use crate::resolver::{IntentResolver, ResolveError};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind HTTP listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub struct GatewayState<P: ModelProvider> {
    dispatcher: Dispatcher,
    resolver: IntentResolver<P>,
}

impl<P: ModelProvider> GatewayState<P> {
    pub fn new(dispatcher: Dispatcher, resolver: IntentResolver<P>) -> Self {
        Self {
            dispatcher,
            resolver,
        }
    }
}

pub async fn serve<P>(state: Arc<GatewayState<P>>, addr: SocketAddr) -> Result<(), ServerError>
where
    P: ModelProvider + 'static,
{
    info!(%addr, "Binding gateway HTTP server");

    // The original host served a browser test page from anywhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/mcp", post(mcp_handler::<P>))
        .route("/api/mcp/sse", get(sse_handler))
        .route("/api/nlp", post(nlp_handler::<P>))
        .layer(cors)
        .with_state(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Gateway HTTP server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

#[derive(Debug, Deserialize)]
struct McpCallRequest {
    tool: String,
    #[serde(default)]
    params: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type HandlerResult = Result<Json<Value>, (StatusCode, Json<ErrorResponse>)>;

fn dispatch_failure(err: &DispatchError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        DispatchError::Catalog(_) => StatusCode::NOT_FOUND,
        DispatchError::Coerce(_) => StatusCode::BAD_REQUEST,
        DispatchError::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
        }),
    )
}

async fn mcp_handler<P: ModelProvider>(
    State(state): State<Arc<GatewayState<P>>>,
    Json(payload): Json<McpCallRequest>,
) -> HandlerResult {
    if payload.tool.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "tool name must be provided".to_string(),
            }),
        ));
    }

    let arguments = payload.params.unwrap_or_default();
    debug!(tool = payload.tool.as_str(), "Received /api/mcp request");

    match state.dispatcher.invoke(&payload.tool, &arguments).await {
        Ok(items) => Ok(Json(json!({ "result": items }))),
        Err(err) => {
            error!(tool = payload.tool.as_str(), %err, "Tool invocation failed");
            Err(dispatch_failure(&err))
        }
    }
}

fn heartbeat_payload() -> String {
    json!({
        "type": "heartbeat",
        "timestamp": Utc::now().to_rfc3339(),
    })
    .to_string()
}

/// Liveness channel only: one heartbeat event per interval, no tool data.
/// The stream (and its timer) is dropped as soon as the consumer
/// disconnects.
async fn sse_handler() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let ticks = IntervalStream::new(tokio::time::interval(HEARTBEAT_INTERVAL));
    let stream = ticks.map(|_| Ok(Event::default().data(heartbeat_payload())));
    Sse::new(stream)
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
}

async fn nlp_handler<P: ModelProvider>(
    State(state): State<Arc<GatewayState<P>>>,
    Json(payload): Json<QueryRequest>,
) -> HandlerResult {
    if payload.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "query is required".to_string(),
            }),
        ));
    }

    info!("Processing natural language query");
    match state
        .resolver
        .answer(&payload.query, &state.dispatcher)
        .await
    {
        Ok(items) => Ok(Json(json!({ "result": items }))),
        Err(err) => {
            error!(%err, "Natural language query failed");
            let status = match &err {
                ResolveError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ResolveError::Unavailable(_) => StatusCode::BAD_GATEWAY,
                ResolveError::Unparsable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ResolveError::Dispatch(inner) => return Err(dispatch_failure(inner)),
            };
            Err((
                status,
                Json(ErrorResponse {
                    error: err.user_message(),
                }),
            ))
        }
    }
}
