// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The client hub: a registry of connected MCP servers, the `initialize`
//! handshake, request/response correlation with per-request timeouts, and
//! routing of inbound notifications and requests back to the application.
//!
//! Callers hold this behind an `Arc` — each registered server spawns a
//! background task draining its transport's event stream, and that task
//! needs to call back into the hub (to resolve a pending request or answer
//! an inbound `ping`) for as long as the server stays registered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};

use super::config::ServerConfig;
use super::message::{Message, NotificationMessage, RequestId, RequestMessage, ResponseMessage};
use super::protocol::{
    ClientInfo, InitializeParams, InitializeResult, Prompt, PromptGetParams, PromptMessage,
    PromptsGetResult, PromptsListResult, Resource, ResourceContent, ResourcesListResult,
    ResourcesReadResult, Tool, ToolCall, ToolResult, ToolsListResult,
};
use super::transport::{Transport, TransportError, TransportEvent};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Disconnected,
    Connected,
    Error,
}

struct ServerEntry {
    config: ServerConfig,
    status: ServerStatus,
    last_error: Option<String>,
    connection: Arc<dyn Transport>,
    request_timeout_ms: u64,
}

struct PendingRequest {
    resolver: oneshot::Sender<Result<Value, ClientError>>,
    timer: tokio::task::AbortHandle,
}

/// Events the hub emits to the embedder. A closed enum, not a name→callback
/// bus: `serverMessage`/`notification`/etc. carry distinct payload shapes.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    ServerConnected {
        server_id: String,
        config: ServerConfig,
    },
    ServerError {
        server_id: String,
        error: String,
    },
    ServerDisconnected {
        server_id: String,
    },
    Notification {
        server_id: String,
        method: String,
        params: Option<Value>,
    },
    ServerMessage {
        server_id: String,
        params: Option<Value>,
    },
    ResourcesUpdated {
        server_id: String,
    },
    ToolsUpdated {
        server_id: String,
    },
    PromptsUpdated {
        server_id: String,
    },
    RequestCancelled {
        server_id: String,
        params: Option<Value>,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unknown server: {0}")]
    UnknownServer(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    ServerError(String),

    #[error("Client disconnected")]
    Disconnected,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub struct ClientHub {
    client_info: ClientInfo,
    registry: Mutex<HashMap<String, ServerEntry>>,
    pending: Mutex<HashMap<u64, PendingRequest>>,
    next_request_id: AtomicU64,
    events_tx: mpsc::UnboundedSender<ClientEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ClientEvent>>>,
}

impl ClientHub {
    pub fn new(client_info: ClientInfo) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            client_info,
            registry: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            next_request_id: AtomicU64::new(1),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
        })
    }

    /// Hand over the event receiver. Callable once.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ClientEvent>> {
        self.events_rx.try_lock().ok()?.take()
    }

    /// Lifecycle logging is silent unless `METIS_VERBOSE=true`, in which case
    /// it prints to stdout (not stderr — stderr is reserved for the embedder's
    /// own diagnostics).
    fn log(&self, message: impl std::fmt::Display) {
        if std::env::var("METIS_VERBOSE").as_deref() == Ok("true") {
            println!("[metis-mcp] {message}");
        }
    }

    // ========================================================================
    // Registration / lifecycle
    // ========================================================================

    /// Register a server over an already-connected transport, run the
    /// `initialize` handshake, and either mark it connected or record the
    /// failure. Double-registration under the same id overwrites silently.
    pub async fn register_server(
        self: &Arc<Self>,
        server_id: impl Into<String>,
        config: ServerConfig,
        connection: Arc<dyn Transport>,
        request_timeout_ms: Option<u64>,
    ) -> Result<(), ClientError> {
        let server_id = server_id.into();
        let request_timeout_ms = request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        if let Some(events) = connection.take_events() {
            self.spawn_dispatch_loop(server_id.clone(), events);
        }

        self.registry.lock().await.insert(
            server_id.clone(),
            ServerEntry {
                config: config.clone(),
                status: ServerStatus::Disconnected,
                last_error: None,
                connection,
                request_timeout_ms,
            },
        );

        match self.initialize_server(&server_id).await {
            Ok(()) => {
                self.set_status(&server_id, ServerStatus::Connected, None)
                    .await;
                let _ = self.events_tx.send(ClientEvent::ServerConnected {
                    server_id,
                    config,
                });
                Ok(())
            }
            Err(err) => {
                self.set_status(&server_id, ServerStatus::Error, Some(err.to_string()))
                    .await;
                let _ = self.events_tx.send(ClientEvent::ServerError {
                    server_id,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn initialize_server(self: &Arc<Self>, server_id: &str) -> Result<(), ClientError> {
        let params = InitializeParams::new(self.client_info.clone());
        let result = self
            .send_request(server_id, "initialize", Some(serde_json::to_value(&params)?))
            .await?;
        let _result: InitializeResult = serde_json::from_value(result)?;

        let connection = self.connection_for(server_id).await?;
        connection
            .send(&Message::notification("notifications/initialized", None))
            .await?;
        Ok(())
    }

    /// Close the connection and remove the registry entry.
    pub async fn unregister_server(self: &Arc<Self>, server_id: &str) -> Result<(), ClientError> {
        let entry = self.registry.lock().await.remove(server_id);
        if let Some(entry) = entry {
            let _ = entry.connection.close().await;
        }
        let _ = self.events_tx.send(ClientEvent::ServerDisconnected {
            server_id: server_id.to_string(),
        });
        Ok(())
    }

    /// Unregister every server and reject every pending request. Leaves the
    /// hub usable for fresh registrations afterwards.
    pub async fn disconnect(self: &Arc<Self>) {
        let server_ids: Vec<String> = self.registry.lock().await.keys().cloned().collect();
        for server_id in server_ids {
            let _ = self.unregister_server(&server_id).await;
        }

        let mut pending = self.pending.lock().await;
        for (_, entry) in pending.drain() {
            entry.timer.abort();
            let _ = entry.resolver.send(Err(ClientError::Disconnected));
        }
    }

    pub async fn server_status(&self, server_id: &str) -> Option<ServerStatus> {
        self.registry.lock().await.get(server_id).map(|e| e.status)
    }

    pub async fn last_error(&self, server_id: &str) -> Option<String> {
        self.registry
            .lock()
            .await
            .get(server_id)
            .and_then(|e| e.last_error.clone())
    }

    async fn set_status(&self, server_id: &str, status: ServerStatus, last_error: Option<String>) {
        if let Some(entry) = self.registry.lock().await.get_mut(server_id) {
            entry.status = status;
            entry.last_error = last_error;
        }
    }

    async fn connection_for(&self, server_id: &str) -> Result<Arc<dyn Transport>, ClientError> {
        self.registry
            .lock()
            .await
            .get(server_id)
            .map(|e| e.connection.clone())
            .ok_or_else(|| ClientError::UnknownServer(server_id.to_string()))
    }

    // ========================================================================
    // Request correlation
    // ========================================================================

    async fn send_request(
        self: &Arc<Self>,
        server_id: &str,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, ClientError> {
        let (connection, timeout_ms) = {
            let registry = self.registry.lock().await;
            let entry = registry
                .get(server_id)
                .ok_or_else(|| ClientError::UnknownServer(server_id.to_string()))?;
            (entry.connection.clone(), entry.request_timeout_ms)
        };

        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        let hub = self.clone();
        let timer_method = method.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            if let Some(pending) = hub.pending.lock().await.remove(&id) {
                let _ = pending
                    .resolver
                    .send(Err(ClientError::Timeout(timer_method)));
            }
        });

        self.pending.lock().await.insert(
            id,
            PendingRequest {
                resolver: tx,
                timer: timer.abort_handle(),
            },
        );

        let message = Message::request(RequestId::Number(id as i64), method, params);
        if let Err(err) = connection.send(&message).await {
            if let Some(pending) = self.pending.lock().await.remove(&id) {
                pending.timer.abort();
            }
            return Err(ClientError::Transport(err));
        }

        rx.await.map_err(|_| ClientError::Disconnected)?
    }

    async fn resolve_pending(&self, response: ResponseMessage) {
        let id = match response.id {
            RequestId::Number(n) if n >= 0 => n as u64,
            _ => return,
        };
        if let Some(pending) = self.pending.lock().await.remove(&id) {
            pending.timer.abort();
            let result = response
                .outcome
                .map_err(|err| ClientError::ServerError(err.message));
            let _ = pending.resolver.send(result);
        }
        // Unknown ids (already timed out, or not ours) are silently dropped.
    }

    // ========================================================================
    // Inbound dispatch
    // ========================================================================

    fn spawn_dispatch_loop(
        self: &Arc<Self>,
        server_id: String,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        let hub = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    TransportEvent::Message(message) => hub.handle_inbound(&server_id, message).await,
                    TransportEvent::Error(err) => {
                        hub.log(format!("[{server_id}] transport error: {err}"));
                    }
                    TransportEvent::Stderr(line) => {
                        hub.log(format!("[{server_id}] stderr: {line}"));
                    }
                    TransportEvent::Connect => {}
                    TransportEvent::Disconnect { code, reason } => {
                        hub.log(format!("[{server_id}] disconnected: {code:?} {reason:?}"));
                        hub.set_status(&server_id, ServerStatus::Error, reason).await;
                        let _ = hub.events_tx.send(ClientEvent::ServerDisconnected {
                            server_id: server_id.clone(),
                        });
                        break;
                    }
                }
            }
        });
    }

    async fn handle_inbound(self: &Arc<Self>, server_id: &str, message: Message) {
        match message {
            Message::Response(resp) => self.resolve_pending(resp).await,
            Message::Notification(notif) => self.handle_notification(server_id, notif).await,
            Message::Request(req) => self.handle_inbound_request(server_id, req).await,
        }
    }

    async fn handle_notification(&self, server_id: &str, notif: NotificationMessage) {
        if notif.method == "notifications/cancelled" {
            let _ = self.events_tx.send(ClientEvent::RequestCancelled {
                server_id: server_id.to_string(),
                params: notif.params.clone(),
            });
        }
        let _ = self.events_tx.send(ClientEvent::Notification {
            server_id: server_id.to_string(),
            method: notif.method.clone(),
            params: notif.params.clone(),
        });

        let named = match notif.method.as_str() {
            "notifications/message" => Some(ClientEvent::ServerMessage {
                server_id: server_id.to_string(),
                params: notif.params,
            }),
            "notifications/resources/updated" => Some(ClientEvent::ResourcesUpdated {
                server_id: server_id.to_string(),
            }),
            "notifications/tools/updated" => Some(ClientEvent::ToolsUpdated {
                server_id: server_id.to_string(),
            }),
            "notifications/prompts/updated" => Some(ClientEvent::PromptsUpdated {
                server_id: server_id.to_string(),
            }),
            _ => None,
        };
        if let Some(event) = named {
            let _ = self.events_tx.send(event);
        }
    }

    /// Only `ping` is answered; everything else is METHOD_NOT_FOUND.
    async fn handle_inbound_request(&self, server_id: &str, req: RequestMessage) {
        let response = if req.method == "ping" {
            Message::response_ok(req.id, serde_json::json!({"pong": true}))
        } else {
            Message::response_err(req.id, super::message::ErrorObject::method_not_found(&req.method))
        };

        if let Ok(connection) = self.connection_for(server_id).await {
            let _ = connection.send(&response).await;
        }
    }

    // ========================================================================
    // High-level operations
    // ========================================================================

    pub async fn list_resources(
        self: &Arc<Self>,
        server_id: &str,
    ) -> Result<Vec<Resource>, ClientError> {
        let result = self.send_request(server_id, "resources/list", None).await?;
        let parsed: ResourcesListResult = serde_json::from_value(result)?;
        Ok(parsed.resources)
    }

    pub async fn get_resource(
        self: &Arc<Self>,
        server_id: &str,
        uri: &str,
    ) -> Result<ResourceContent, ClientError> {
        let params = serde_json::json!({ "uri": uri });
        let result = self
            .send_request(server_id, "resources/read", Some(params))
            .await?;
        let mut parsed: ResourcesReadResult = serde_json::from_value(result)?;
        if parsed.contents.is_empty() {
            return Err(ClientError::ServerError(format!(
                "no resource content for {uri}"
            )));
        }
        Ok(parsed.contents.remove(0))
    }

    pub async fn list_tools(self: &Arc<Self>, server_id: &str) -> Result<Vec<Tool>, ClientError> {
        let result = self.send_request(server_id, "tools/list", None).await?;
        let parsed: ToolsListResult = serde_json::from_value(result)?;
        Ok(parsed.tools)
    }

    pub async fn call_tool(
        self: &Arc<Self>,
        server_id: &str,
        call: ToolCall,
    ) -> Result<ToolResult, ClientError> {
        let params = serde_json::to_value(&call)?;
        let result = self.send_request(server_id, "tools/call", Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn list_prompts(self: &Arc<Self>, server_id: &str) -> Result<Vec<Prompt>, ClientError> {
        let result = self.send_request(server_id, "prompts/list", None).await?;
        let parsed: PromptsListResult = serde_json::from_value(result)?;
        Ok(parsed.prompts)
    }

    pub async fn get_prompt(
        self: &Arc<Self>,
        server_id: &str,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<Vec<PromptMessage>, ClientError> {
        let params = PromptGetParams {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .send_request(server_id, "prompts/get", Some(serde_json::to_value(&params)?))
            .await?;
        let parsed: PromptsGetResult = serde_json::from_value(result)?;
        Ok(parsed.messages)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
