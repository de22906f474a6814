// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `metis-mcp` binary entry point.
//!
//! Two demonstration subcommands wrap the library's two hubs:
//! - `serve` drives a [`ServerHub`] off this process's own stdin/stdout,
//!   acting as an MCP server a host application can spawn as a child.
//! - `connect` loads a client config file, registers every server it
//!   describes against a single [`ClientHub`], prints what each exposes,
//!   then holds the process open until `SIGINT`/`SIGTERM` before tearing
//!   everything down.
//!
//! Per the library's design, the hub is constructed once here, at the
//! outermost binary layer — nothing inside `metis_mcp::mcp` reaches for a
//! process-wide singleton of its own.

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use metis_mcp::mcp::config::{load_mcp_config, ServerConfig as McpServerConfig};
use metis_mcp::mcp::message::Message;
use metis_mcp::mcp::server::ServerHub;
use metis_mcp::mcp::transport;
use metis_mcp::mcp::{ClientHub, ClientInfo, ServerCapabilityFlags};

#[derive(Parser)]
#[command(name = "metis-mcp", version, about = "Model Context Protocol client/server hub")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as an MCP server over this process's own stdin/stdout.
    Serve {
        #[arg(long, default_value = "metis-mcp")]
        name: String,
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        version: String,
        #[arg(long)]
        resources: bool,
        #[arg(long)]
        tools: bool,
        #[arg(long)]
        prompts: bool,
        #[arg(long)]
        logging: bool,
    },
    /// Connect to every server named in a config file and list what they expose.
    Connect {
        /// Path to a JSON/JSON5 config file, or an inline JSON document.
        #[arg(long)]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            name,
            version,
            resources,
            tools,
            prompts,
            logging,
        } => run_serve(name, version, resources, tools, prompts, logging).await,
        Commands::Connect { config } => run_connect(config).await,
    }
}

/// Read one JSON-RPC message per line from stdin, dispatch it against
/// `hub`, and write any reply to stdout — the minimal line-framed loop an
/// embedder spawning this binary as a child process would drive.
async fn run_serve(
    name: String,
    version: String,
    resources: bool,
    tools: bool,
    prompts: bool,
    logging: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let hub = ServerHub::new(McpServerConfig {
        name,
        version,
        description: None,
        author: None,
        homepage: None,
        capabilities: ServerCapabilityFlags {
            resources,
            tools,
            prompts,
            logging,
        },
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let stdout = std::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message = match Message::from_wire(&line) {
            Ok(message) => message,
            Err(err) => {
                eprintln!("[metis-mcp] failed to parse message: {err}");
                continue;
            }
        };
        if let Some(response) = hub.dispatch(message).await {
            let text = response.to_wire()?;
            let mut out = stdout.lock();
            out.write_all(text.as_bytes())?;
            out.write_all(b"\n")?;
            out.flush()?;
        }
    }
    Ok(())
}

async fn run_connect(config_input: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_mcp_config(&config_input)?;
    let hub = ClientHub::new(ClientInfo {
        name: "metis-mcp".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    for (server_id, entry) in &config.servers {
        let connection: Arc<dyn transport::Transport> = transport::create(&entry.transport)?.into();
        connection.connect().await?;

        let server_config = McpServerConfig {
            name: server_id.clone(),
            version: "unknown".to_string(),
            description: None,
            author: None,
            homepage: None,
            capabilities: ServerCapabilityFlags::default(),
        };

        match hub
            .register_server(server_id.clone(), server_config, connection, Some(entry.timeout_ms))
            .await
        {
            Ok(()) => {
                let tools = hub.list_tools(server_id).await.unwrap_or_default();
                println!("{server_id}: {} tool(s)", tools.len());
                for tool in tools {
                    println!("  - {}: {}", tool.name, tool.description);
                }
            }
            Err(err) => eprintln!("{server_id}: failed to connect: {err}"),
        }
    }

    wait_for_shutdown_signal().await;
    hub.disconnect().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => return,
    };
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
