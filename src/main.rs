use clap::{Parser, ValueEnum};
use mcp_gateway::config::AppConfig;
use mcp_gateway::dispatch::Dispatcher;
use mcp_gateway::model::OllamaClient;
use mcp_gateway::resolver::IntentResolver;
use mcp_gateway::server::GatewayState;
use mcp_gateway::transport::{HttpTransport, StdioTransport, TransportClient};
use mcp_gateway::{providers, server, shell, stdio};
use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "mcp-gateway",
    version,
    about = "Tool-invocation gateway over stdio JSON-RPC and HTTP"
)]
struct Cli {
    #[arg(long)]
    config: Option<String>,
    #[arg(long, value_enum, default_value_t = RunMode::Serve)]
    mode: RunMode,
    /// Listen address for --mode serve.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
    /// Transport for --mode shell.
    #[arg(long, value_enum, default_value_t = TransportKind::Stdio)]
    transport: TransportKind,
    /// Child command for the stdio transport (defaults to this binary in
    /// --mode stdio).
    #[arg(long)]
    command: Option<String>,
    /// Gateway endpoint for the http transport.
    #[arg(long, default_value = "http://127.0.0.1:8080/api/mcp")]
    endpoint: String,
    /// Child arguments (stdio shell) or the query words (ask mode).
    rest: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunMode {
    /// Expose the catalog over HTTP.
    Serve,
    /// Serve the line-delimited JSON-RPC protocol on stdin/stdout.
    Stdio,
    /// Interactive tool shell over a transport adapter.
    Shell,
    /// One-shot natural-language query through the intent resolver.
    Ask,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportKind {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let config = AppConfig::load(config_path)?;

    match cli.mode {
        RunMode::Serve => {
            let state = gateway_state(&config)?;
            info!(addr = %cli.addr, "Starting gateway HTTP server");
            server::serve(state, cli.addr).await?;
        }
        RunMode::Stdio => {
            let catalog = providers::build_catalog()?;
            let dispatcher = Arc::new(Dispatcher::new(Arc::new(catalog)));
            info!("Entering stdio gateway mode; awaiting JSON-RPC lines");
            stdio::run(dispatcher).await?;
        }
        RunMode::Shell => {
            let mut client: Box<dyn TransportClient> = match cli.transport {
                TransportKind::Stdio => {
                    let command = cli.command.clone().unwrap_or_else(default_child_command);
                    let mut args = cli.rest.clone();
                    if cli.command.is_none() && args.is_empty() {
                        args = vec!["--mode".to_string(), "stdio".to_string()];
                    }
                    info!(command = command.as_str(), "Using stdio transport");
                    Box::new(StdioTransport::new(command, args))
                }
                TransportKind::Http => {
                    info!(endpoint = cli.endpoint.as_str(), "Using http transport");
                    Box::new(HttpTransport::new(cli.endpoint.clone()))
                }
            };
            client.connect().await?;
            shell::run(client.as_mut()).await?;
        }
        RunMode::Ask => {
            if cli.rest.is_empty() {
                return Err("ask mode requires a query".into());
            }
            let query = cli.rest.join(" ");
            let catalog = providers::build_catalog()?;
            let dispatcher = Dispatcher::new(Arc::new(catalog));
            let resolver = IntentResolver::new(
                Arc::new(OllamaClient::new(config.ollama_url.clone())),
                config.model.clone(),
                config.resolve_timeout(),
            );
            info!("Resolving one-shot query");
            let items = resolver.answer(&query, &dispatcher).await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    info!("Gateway execution finished");
    Ok(())
}

fn gateway_state(config: &AppConfig) -> Result<Arc<GatewayState<OllamaClient>>, Box<dyn Error>> {
    let catalog = providers::build_catalog()?;
    let dispatcher = Dispatcher::new(Arc::new(catalog));
    let resolver = IntentResolver::new(
        Arc::new(OllamaClient::new(config.ollama_url.clone())),
        config.model.clone(),
        config.resolve_timeout(),
    );
    Ok(Arc::new(GatewayState::new(dispatcher, resolver)))
}

fn default_child_command() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.to_str().map(str::to_string))
        .unwrap_or_else(|| "mcp-gateway".to_string())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // Stderr keeps stdout clean for the stdio protocol and shell output.
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
