// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The three capability contracts embedders implement to back a
//! [`super::server::ServerHub`]: resource, tool, and prompt providers.
//!
//! These are external collaborators this crate never implements itself —
//! only the contract and the dispatch that consumes it live here.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::protocol::{Prompt, PromptMessage, Resource, ResourceContent, Tool, ToolResult};

/// Error a provider may raise. Resource/prompt provider errors are swallowed
/// by the dispatcher and the search continues with the next provider; tool
/// provider errors are fatal for the whole `tools/call` dispatch.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProviderError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Supplies addressable resources by URI.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn list_resources(&self) -> Result<Vec<Resource>, ProviderError>;

    /// Return `Ok(None)` when this provider has nothing for `uri` (the
    /// dispatcher tries the next provider); `Err` is swallowed the same way.
    async fn get_resource(
        &self,
        uri: &str,
    ) -> Result<Option<ResourceContent>, ProviderError>;
}

/// Supplies named, JSON-Schema-described tools.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<Tool>, ProviderError>;

    /// Return `Ok(None)` when this provider does not own `name` (the
    /// dispatcher tries the next provider). An `Err` here is fatal for the
    /// whole dispatch and converts to `TOOL_ERROR`.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<Option<ToolResult>, ProviderError>;
}

/// Supplies named, parameterised prompt templates.
#[async_trait]
pub trait PromptProvider: Send + Sync {
    async fn list_prompts(&self) -> Result<Vec<Prompt>, ProviderError>;

    /// Return `Ok(None)` when this provider does not own `name`.
    async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<&std::collections::HashMap<String, String>>,
    ) -> Result<Option<Vec<PromptMessage>>, ProviderError>;
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
