// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration: the server-identity block an embedder supplies to
//! [`super::server::ServerHub::new`], and the client-side config file format
//! (`servers` keyed by name, each a tagged [`super::transport::TransportConfig`]
//! plus a request timeout) that [`crate::mcp::client::ClientHub`] loads to
//! know what to connect to.
//!
//! File parsing tries JSON5 first (comments, trailing commas), falling back
//! to strict JSON.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::transport::TransportConfig;

fn default_timeout_ms() -> u64 {
    30_000
}

/// The name/version/capability identity a server advertises during
/// `initialize`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default)]
    pub capabilities: ServerCapabilityFlags,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilityFlags {
    #[serde(default)]
    pub resources: bool,
    #[serde(default)]
    pub tools: bool,
    #[serde(default)]
    pub prompts: bool,
    #[serde(default)]
    pub logging: bool,
}

/// One entry in a client-side `servers` map: how to reach it, plus the
/// per-request timeout used for every round trip on this connection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct McpServerEntry {
    #[serde(flatten)]
    pub transport: TransportConfig,
    #[serde(default = "default_timeout_ms", rename = "timeoutMs")]
    pub timeout_ms: u64,
}

/// Root of a client-side MCP configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: HashMap<String, McpServerEntry>,
}

impl McpConfig {
    /// Load from a file path (JSON5, falling back to strict JSON).
    pub fn load(path: &Path) -> Result<Self, McpConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| McpConfigError::Io(path.display().to_string(), e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse from string content.
    pub fn parse(content: &str) -> Result<Self, McpConfigError> {
        json5::from_str(content)
            .or_else(|_| serde_json::from_str(content))
            .map_err(|e| McpConfigError::Parse(e.to_string()))
    }

    /// Parse from a strict inline JSON string (e.g. a `--mcp-config` flag).
    pub fn from_json_str(json: &str) -> Result<Self, McpConfigError> {
        serde_json::from_str(json).map_err(|e| McpConfigError::Parse(e.to_string()))
    }

    /// Merge configs: later configs override earlier ones, by server name.
    pub fn merge(configs: impl IntoIterator<Item = Self>) -> Self {
        let mut merged = Self::default();
        for config in configs {
            merged.servers.extend(config.servers);
        }
        merged
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    pub fn has_servers(&self) -> bool {
        !self.servers.is_empty()
    }
}

/// Load MCP configuration from either a path or an inline JSON string,
/// guessing based on whether the input looks like a JSON document.
pub fn load_mcp_config(input: &str) -> Result<McpConfig, McpConfigError> {
    let trimmed = input.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        McpConfig::parse(trimmed)
    } else {
        McpConfig::load(Path::new(input))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum McpConfigError {
    #[error("failed to read MCP config from {0}: {1}")]
    Io(String, String),

    #[error("failed to parse MCP config: {0}")]
    Parse(String),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
