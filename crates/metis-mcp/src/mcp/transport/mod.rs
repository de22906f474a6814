// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction: three concrete variants (stdio, WebSocket, HTTP)
//! behind one [`Transport`] trait, plus the tagged-configuration
//! [`TransportConfig`] and the [`create`] factory that builds the right
//! concrete transport from it.

pub mod http;
pub mod stdio;
pub mod websocket;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::message::Message;

pub use http::{HttpConfig, HttpTransport};
pub use stdio::{StdioConfig, StdioTransport};
pub use websocket::{WebSocketConfig, WebSocketTransport};

/// Events a transport pushes onto its outbound channel. Modeled as a closed
/// enum rather than an untyped name→callback bus, since `message`, `error`,
/// and `disconnect` carry different payload shapes.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Message(Message),
    Error(String),
    Disconnect {
        code: Option<u16>,
        reason: Option<String>,
    },
    Connect,
    /// Out-of-band child-process stderr (stdio transport only).
    Stderr(String),
}

/// Errors a transport operation can raise.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,

    #[error("failed to spawn process: {0}")]
    Spawn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode/decode message: {0}")]
    Message(#[from] super::message::MessageError),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP response status {0}")]
    HttpStatus(u16),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("transport already closed")]
    Closed,
}

/// Every transport's contract: connect/send/close/is_connected, all
/// idempotent with respect to already-reached terminal states, plus an
/// event stream the caller drains exactly once.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn send(&self, message: &Message) -> Result<(), TransportError>;
    async fn close(&self) -> Result<(), TransportError>;
    async fn is_connected(&self) -> bool;

    /// Hand over this transport's event receiver. Returns `None` if already
    /// taken; callers are expected to call this exactly once, immediately
    /// after constructing the transport.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<TransportEvent>>;
}

// ============================================================================
// Transport factory
// ============================================================================

/// Tagged transport configuration. Unknown `type` values are rejected by
/// serde at config-parse time rather than deferred to `create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    Stdio(StdioConfig),
    Websocket(WebSocketConfig),
    Http(HttpConfig),
}

/// Construct the concrete transport described by `config`.
pub fn create(config: &TransportConfig) -> Result<Box<dyn Transport>, TransportError> {
    match config {
        TransportConfig::Stdio(cfg) => Ok(Box::new(StdioTransport::new(cfg.clone()))),
        TransportConfig::Websocket(cfg) => Ok(Box::new(WebSocketTransport::new(cfg.clone()))),
        TransportConfig::Http(cfg) => Ok(Box::new(HttpTransport::new(cfg.clone()))),
    }
}

/// Common header-map shape reused across WebSocket/HTTP configuration.
pub type HeaderMap = HashMap<String, String>;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
