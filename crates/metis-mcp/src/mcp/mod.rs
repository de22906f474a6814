// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Model Context Protocol client/server hub.
//!
//! This crate is a bidirectional MCP implementation: it can act as a client
//! connecting out to MCP servers over stdio, WebSocket, or HTTP, and as a
//! server exposing resource/tool/prompt providers to connected peers over
//! any of the same transports.
//!
//! Key features:
//! - Configuration file parsing (JSON and JSON5)
//! - Pluggable transports: stdio subprocess, WebSocket, HTTP
//! - MCP protocol message types over a JSON-RPC 2.0 envelope
//! - Client hub for server registration, handshake, and request correlation
//! - Server hub for capability-gated dispatch across provider registries
//!
//! # Example
//!
//! ```ignore
//! use metis_mcp::mcp::client::ClientHub;
//! use metis_mcp::mcp::protocol::ClientInfo;
//! use metis_mcp::mcp::transport::{StdioConfig, StdioTransport, Transport};
//! use std::sync::Arc;
//!
//! let hub = ClientHub::new(ClientInfo { name: "demo".into(), version: "0.1.0".into() });
//! let transport = StdioTransport::new(StdioConfig {
//!     command: "my-mcp-server".into(),
//!     args: Vec::new(),
//!     env: Default::default(),
//!     cwd: None,
//! });
//! transport.connect().await?;
//! let connection: Arc<dyn Transport> = Arc::new(transport);
//! hub.register_server("demo", server_config, connection, None).await?;
//! let tools = hub.list_tools("demo").await?;
//! ```

pub mod client;
pub mod config;
pub mod message;
pub mod protocol;
pub mod provider;
pub mod server;
pub mod transport;

pub use client::{ClientError, ClientEvent, ClientHub, ServerStatus};
pub use config::{
    load_mcp_config, McpConfig, McpConfigError, McpServerEntry, ServerCapabilityFlags,
    ServerConfig,
};
pub use message::{
    ErrorObject, Message, MessageError, NotificationMessage, RequestId, RequestMessage,
    ResponseMessage,
};
pub use protocol::{
    ClientCapabilities, ClientInfo, ContentItem, InitializeParams, InitializeResult, Prompt,
    PromptArgument, PromptGetParams, PromptMessage, PromptsGetResult, PromptsListResult,
    Resource, ResourceContent, ResourcesListResult, ResourcesReadResult, Role, ServerCapabilities,
    ServerInfo, Tool, ToolCall, ToolResult, ToolsListResult, PROTOCOL_VERSION,
};
pub use provider::{PromptProvider, ProviderError, ResourceProvider, ToolProvider};
pub use server::{ServerEvent, ServerHub};
pub use transport::{
    create, HttpConfig, HttpTransport, StdioConfig, StdioTransport, Transport, TransportConfig,
    TransportError, TransportEvent, WebSocketConfig, WebSocketTransport,
};
