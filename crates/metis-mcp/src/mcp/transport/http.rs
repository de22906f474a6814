// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport: each [`Transport::send`] is a single-shot POST/PUT whose
//! response body is itself the reply message. There is no independent push
//! channel, so the reply is re-surfaced on the transport's event stream the
//! same way an async frame would arrive over stdio or WebSocket — this lets
//! [`super::super::client::ClientHub`] treat all three transport kinds
//! uniformly.
//!
//! `connect()` has nothing to dial, so it proves reachability with a
//! synthetic `ping` request instead of no-op-ing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};

use super::{Transport, TransportError, TransportEvent};
use crate::mcp::message::{Message, RequestId};

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_method() -> HttpMethod {
    HttpMethod::Post
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

pub struct HttpTransport {
    config: HttpConfig,
    client: reqwest::Client,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<TransportEvent>>>,
    connected: AtomicBool,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            client: reqwest::Client::new(),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
            connected: AtomicBool::new(false),
        }
    }

    fn build_request(&self, body: &str) -> reqwest::RequestBuilder {
        let builder = match self.config.method {
            HttpMethod::Post => self.client.post(&self.config.url),
            HttpMethod::Put => self.client.put(&self.config.url),
        };
        let mut builder = builder
            .header("content-type", "application/json")
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .body(body.to_string());
        for (key, value) in &self.config.headers {
            builder = builder.header(key, value);
        }
        builder
    }

    /// `Ok(None)` means an empty response body — the wire contract for "no
    /// reply", not an error.
    async fn post_message(&self, message: &Message) -> Result<Option<Message>, TransportError> {
        let text = message.to_wire()?;
        let response = self
            .build_request(&text)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        Message::from_wire(&body).map(Some).map_err(TransportError::from)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let ping = Message::request(RequestId::String("__ping__".to_string()), "ping", None);
        self.post_message(&ping).await?;
        self.connected.store(true, Ordering::Release);
        let _ = self.events_tx.send(TransportEvent::Connect);
        Ok(())
    }

    async fn send(&self, message: &Message) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(TransportError::NotConnected);
        }
        if matches!(message, Message::Notification(_)) {
            let text = message.to_wire()?;
            self.build_request(&text)
                .send()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?;
            return Ok(());
        }
        if let Some(response) = self.post_message(message).await? {
            let _ = self.events_tx.send(TransportEvent::Message(response));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events_rx.try_lock().ok()?.take()
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
