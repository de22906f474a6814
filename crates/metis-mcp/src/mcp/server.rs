// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The server hub: dispatches inbound requests to the right provider
//! registry, enforces declared capabilities, and broadcasts change
//! notifications to every attached peer.
//!
//! Registries are `IndexMap`s rather than `HashMap`s so that "first
//! provider to answer wins" (resources/read, tools/call, prompts/get)
//! respects registration order, as the source's own iteration does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

use super::config::ServerConfig;
use super::message::{
    ErrorObject, Message, NotificationMessage, INVALID_PARAMS, METHOD_NOT_FOUND,
};
use super::protocol::{
    InitializeResult, PromptGetParams, PromptsGetResult, PromptsListResult, ResourcesListResult,
    ResourcesReadResult, ServerCapabilities, ServerInfo, ToolsListResult, PROTOCOL_VERSION,
};
use super::provider::{PromptProvider, ResourceProvider, ToolProvider};
use super::transport::{Transport, TransportEvent};

/// Events the server hub emits. No observable action is required of the
/// embedder beyond whatever it wants to log or surface.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Initialized,
    Notification {
        method: String,
        params: Option<Value>,
    },
    RequestCancelled {
        params: Option<Value>,
    },
    ConnectionError {
        error: String,
    },
}

pub struct ServerHub {
    config: ServerConfig,
    resource_providers: Mutex<IndexMap<String, Arc<dyn ResourceProvider>>>,
    tool_providers: Mutex<IndexMap<String, Arc<dyn ToolProvider>>>,
    prompt_providers: Mutex<IndexMap<String, Arc<dyn PromptProvider>>>,
    peers: Mutex<Vec<Arc<dyn Transport>>>,
    initialized: AtomicBool,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ServerEvent>>>,
}

impl ServerHub {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            config,
            resource_providers: Mutex::new(IndexMap::new()),
            tool_providers: Mutex::new(IndexMap::new()),
            prompt_providers: Mutex::new(IndexMap::new()),
            peers: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
        })
    }

    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ServerEvent>> {
        self.events_rx.try_lock().ok()?.take()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    // ========================================================================
    // Provider registration — each registration broadcasts its `updated` event.
    // ========================================================================

    pub async fn register_resource_provider(
        self: &Arc<Self>,
        namespace: impl Into<String>,
        provider: Arc<dyn ResourceProvider>,
    ) {
        self.resource_providers
            .lock()
            .await
            .insert(namespace.into(), provider);
        self.broadcast("notifications/resources/updated", None).await;
    }

    pub async fn register_tool_provider(
        self: &Arc<Self>,
        namespace: impl Into<String>,
        provider: Arc<dyn ToolProvider>,
    ) {
        self.tool_providers
            .lock()
            .await
            .insert(namespace.into(), provider);
        self.broadcast("notifications/tools/updated", None).await;
    }

    pub async fn register_prompt_provider(
        self: &Arc<Self>,
        namespace: impl Into<String>,
        provider: Arc<dyn PromptProvider>,
    ) {
        self.prompt_providers
            .lock()
            .await
            .insert(namespace.into(), provider);
        self.broadcast("notifications/prompts/updated", None).await;
    }

    // ========================================================================
    // Peer connections
    // ========================================================================

    /// Attach an already-connected transport as a peer: dispatch its inbound
    /// messages and include it in future broadcasts.
    pub async fn attach_peer(self: &Arc<Self>, connection: Arc<dyn Transport>) {
        let events = connection.take_events();
        self.peers.lock().await.push(connection.clone());
        if let Some(events) = events {
            self.spawn_peer_loop(connection, events);
        }
    }

    fn spawn_peer_loop(
        self: &Arc<Self>,
        connection: Arc<dyn Transport>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        let hub = self.clone();
        let peer = connection;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    TransportEvent::Message(message) => {
                        if let Some(response) = hub.dispatch(message).await {
                            let _ = peer.send(&response).await;
                        }
                    }
                    TransportEvent::Disconnect { .. } => break,
                    TransportEvent::Error(_) | TransportEvent::Stderr(_) | TransportEvent::Connect => {}
                }
            }
            hub.peers.lock().await.retain(|p| !Arc::ptr_eq(p, &peer));
        });
    }

    /// Broadcast a notification to every attached peer. A per-peer send
    /// failure is swallowed and re-emitted as `ConnectionError`; it never
    /// aborts the fan-out to the remaining peers.
    pub async fn broadcast(&self, method: &str, params: Option<Value>) {
        let message = Message::notification(method, params);
        for peer in self.peers.lock().await.iter() {
            if let Err(err) = peer.send(&message).await {
                let _ = self.events_tx.send(ServerEvent::ConnectionError {
                    error: err.to_string(),
                });
            }
        }
    }

    /// Broadcast `notifications/message` with `{level, logger, data}`.
    pub async fn send_message(&self, text: impl Into<String>, level: Option<&str>) {
        let level = level.unwrap_or("info");
        let params = serde_json::json!({
            "level": level,
            "logger": self.config.name,
            "data": text.into(),
        });
        self.broadcast("notifications/message", Some(params)).await;
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    pub async fn dispatch(self: &Arc<Self>, message: Message) -> Option<Message> {
        match message {
            Message::Request(req) => {
                let outcome = self.handle(&req.method, req.params).await;
                Some(match outcome {
                    Ok(value) => Message::response_ok(req.id, value),
                    Err(err) => Message::response_err(req.id, err),
                })
            }
            Message::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            Message::Response(_) => None,
        }
    }

    async fn handle_notification(&self, notif: NotificationMessage) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                self.initialized.store(true, Ordering::Release);
                let _ = self.events_tx.send(ServerEvent::Initialized);
            }
            "notifications/cancelled" => {
                let _ = self.events_tx.send(ServerEvent::RequestCancelled {
                    params: notif.params,
                });
            }
            other => {
                let _ = self.events_tx.send(ServerEvent::Notification {
                    method: other.to_string(),
                    params: notif.params,
                });
            }
        }
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> Result<Value, ErrorObject> {
        match method {
            "initialize" => self.handle_initialize(),
            "ping" => Ok(serde_json::json!({
                "pong": true,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
            "resources/list" => self.handle_resources_list().await,
            "resources/read" => self.handle_resources_read(params).await,
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(params).await,
            "prompts/list" => self.handle_prompts_list().await,
            "prompts/get" => self.handle_prompts_get(params).await,
            other => Err(ErrorObject::method_not_found(other)),
        }
    }

    fn require_capability(&self, enabled: bool, kind: &str) -> Result<(), ErrorObject> {
        if enabled {
            Ok(())
        } else {
            Err(ErrorObject::new(
                METHOD_NOT_FOUND,
                format!("{kind} not supported by this server"),
            ))
        }
    }

    fn handle_initialize(&self) -> Result<Value, ErrorObject> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                resources: self.config.capabilities.resources,
                tools: self.config.capabilities.tools,
                prompts: self.config.capabilities.prompts,
                logging: self.config.capabilities.logging,
            },
            server_info: ServerInfo {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
                description: self.config.description.clone(),
            },
        };
        serde_json::to_value(result)
            .map_err(|e| ErrorObject::internal_error("initialize", e.to_string()))
    }

    async fn handle_resources_list(&self) -> Result<Value, ErrorObject> {
        self.require_capability(self.config.capabilities.resources, "Resources")?;
        let providers = self.resource_providers.lock().await;
        let mut resources = Vec::new();
        for provider in providers.values() {
            if let Ok(mut list) = provider.list_resources().await {
                resources.append(&mut list);
            }
        }
        serde_json::to_value(ResourcesListResult { resources })
            .map_err(|e| ErrorObject::internal_error("resources/list", e.to_string()))
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> Result<Value, ErrorObject> {
        self.require_capability(self.config.capabilities.resources, "Resources")?;
        let uri = params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| ErrorObject::new(INVALID_PARAMS, "missing required parameter: uri"))?;

        let providers = self.resource_providers.lock().await;
        for provider in providers.values() {
            if let Ok(Some(content)) = provider.get_resource(uri).await {
                return serde_json::to_value(ResourcesReadResult {
                    contents: vec![content],
                })
                .map_err(|e| ErrorObject::internal_error("resources/read", e.to_string()));
            }
        }
        Err(ErrorObject::resource_not_found(uri))
    }

    async fn handle_tools_list(&self) -> Result<Value, ErrorObject> {
        self.require_capability(self.config.capabilities.tools, "Tools")?;
        let providers = self.tool_providers.lock().await;
        let mut tools = Vec::new();
        for provider in providers.values() {
            if let Ok(mut list) = provider.list_tools().await {
                tools.append(&mut list);
            }
        }
        serde_json::to_value(ToolsListResult { tools })
            .map_err(|e| ErrorObject::internal_error("tools/list", e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, ErrorObject> {
        self.require_capability(self.config.capabilities.tools, "Tools")?;
        let params =
            params.ok_or_else(|| ErrorObject::new(INVALID_PARAMS, "missing required parameter: name"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ErrorObject::new(INVALID_PARAMS, "missing required parameter: name"))?
            .to_string();
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let providers = self.tool_providers.lock().await;
        for provider in providers.values() {
            match provider.call_tool(&name, arguments.clone()).await {
                Ok(Some(result)) => {
                    return serde_json::to_value(result)
                        .map_err(|e| ErrorObject::internal_error("tools/call", e.to_string()));
                }
                Ok(None) => continue,
                // Unlike resources/prompts, a raising tool provider stops the search.
                Err(err) => {
                    return Err(ErrorObject::tool_error(
                        &name,
                        format!("Tool execution failed: {err}"),
                    ));
                }
            }
        }
        Err(ErrorObject::new(
            METHOD_NOT_FOUND,
            format!("Tool not found: {name}"),
        ))
    }

    async fn handle_prompts_list(&self) -> Result<Value, ErrorObject> {
        self.require_capability(self.config.capabilities.prompts, "Prompts")?;
        let providers = self.prompt_providers.lock().await;
        let mut prompts = Vec::new();
        for provider in providers.values() {
            if let Ok(mut list) = provider.list_prompts().await {
                prompts.append(&mut list);
            }
        }
        serde_json::to_value(PromptsListResult { prompts })
            .map_err(|e| ErrorObject::internal_error("prompts/list", e.to_string()))
    }

    async fn handle_prompts_get(&self, params: Option<Value>) -> Result<Value, ErrorObject> {
        self.require_capability(self.config.capabilities.prompts, "Prompts")?;
        let params =
            params.ok_or_else(|| ErrorObject::new(INVALID_PARAMS, "missing required parameter: name"))?;
        let get_params: PromptGetParams = serde_json::from_value(params)
            .map_err(|e| ErrorObject::new(INVALID_PARAMS, e.to_string()))?;

        let providers = self.prompt_providers.lock().await;
        for provider in providers.values() {
            if let Ok(Some(messages)) = provider
                .get_prompt(&get_params.name, get_params.arguments.as_ref())
                .await
            {
                let result = PromptsGetResult {
                    description: Some(format!("Prompt: {}", get_params.name)),
                    messages,
                };
                return serde_json::to_value(result)
                    .map_err(|e| ErrorObject::internal_error("prompts/get", e.to_string()));
            }
        }
        Err(ErrorObject::new(
            METHOD_NOT_FOUND,
            format!("Prompt not found: {}", get_params.name),
        ))
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
