//! Scratchpad MCP Server: entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use scratchpad_mcp::config::{resolve_token, LogFormat, ServerConfig};
use scratchpad_mcp::protocol::ProtocolHandler;
use scratchpad_mcp::resources::ResourceRegistry;
use scratchpad_mcp::session::SessionTable;
use scratchpad_mcp::transport::StdioTransport;
use scratchpad_mcp::types::InitializeResult;
use scratchpad_mcp::{logging, shared_store};

#[derive(Parser)]
#[command(
    name = "scratchpad-mcp",
    about = "MCP server exposing a shared scratchpad: tools, resources, prompts, and notifications",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Overrides LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format (text, json). Overrides LOG_FORMAT.
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP with an SSE notification stream.
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address (host:port). Defaults to MCP_HOST:MCP_PORT.
        #[arg(long)]
        addr: Option<String>,

        /// Bearer token for authentication.
        /// Also reads from MCP_TOKEN env var.
        #[arg(long)]
        token: Option<String>,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   scratchpad-mcp completions bash > ~/.local/share/bash-completion/completions/scratchpad-mcp
    ///   scratchpad-mcp completions zsh > ~/.zfunc/_scratchpad-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    let mut config = ServerConfig::from_env();
    if let Some(level) = cli.log_level {
        config.log_level = level;
    } else if matches!(command, Commands::Repl) {
        // Keep the console readable.
        config.log_level = "warn".to_string();
    }
    if let Some(format) = cli.log_format.as_deref() {
        config.log_format = LogFormat::parse(format)
            .ok_or_else(|| anyhow::anyhow!("unknown log format: {format}"))?;
    }

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "scratchpad-mcp", &mut std::io::stdout());
        return Ok(());
    }

    let log_control = logging::init(&config)?;

    match command {
        Commands::Serve => {
            let handler = ProtocolHandler::with_config(
                shared_store(),
                Arc::new(SessionTable::new()),
                &config,
            )
            .with_log_control(log_control);
            tracing::info!("{} v{} (stdio)", config.server_name, config.server_version);
            StdioTransport::new(handler)
                .with_keepalive(config.keepalive)
                .run()
                .await?;
        }

        #[cfg(feature = "sse")]
        Commands::ServeHttp { addr, token } => {
            use scratchpad_mcp::transport::SseTransport;

            if let Some(addr) = addr {
                config = config.with_addr(&addr);
            }
            config.token = resolve_token(token.as_deref());

            let handler = ProtocolHandler::with_config(
                shared_store(),
                Arc::new(SessionTable::new()),
                &config,
            )
            .with_log_control(log_control);

            tracing::info!("{} v{} (http)", config.server_name, config.server_version);
            if config.token.is_some() {
                tracing::info!("Auth: bearer token required");
            }

            SseTransport::new(Arc::new(handler), config).run().await?;
        }

        Commands::Info => {
            let result = InitializeResult::for_server(config.server_info());
            let handler =
                ProtocolHandler::with_config(shared_store(), Arc::new(SessionTable::new()), &config);
            let tools = handler.tools().list_tools();
            let info = serde_json::json!({
                "server": result.server_info,
                "protocol_version": result.protocol_version,
                "capabilities": result.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "resources": ResourceRegistry::list_resources().iter().map(|r| r.uri.clone()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Repl => {
            let handler = Arc::new(
                ProtocolHandler::with_config(shared_store(), Arc::new(SessionTable::new()), &config)
                    .with_log_control(log_control),
            );
            let runtime = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || scratchpad_mcp::repl::run(handler, runtime))
                .await??;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
