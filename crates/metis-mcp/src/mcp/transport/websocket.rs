// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket transport: reconnects with exponential backoff unless the peer
//! closed with a code that says "don't" (1000 normal closure, 1008 policy
//! violation). A generation counter invalidates any backoff timer still
//! in flight when the caller explicitly closes the transport, so a stale
//! timer never resurrects a connection the caller asked to tear down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::{Transport, TransportError, TransportEvent};
use crate::mcp::message::Message;

fn default_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_max_reconnect_attempts() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

/// Close codes after which reconnecting would be pointless or unwelcome.
fn is_terminal_close(code: u16) -> bool {
    matches!(code, 1000 | 1008)
}

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    WsMessage,
>;

pub struct WebSocketTransport {
    config: WebSocketConfig,
    sink: std::sync::Arc<Mutex<Option<WsSink>>>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<TransportEvent>>>,
    connected: AtomicBool,
    generation: std::sync::Arc<AtomicU64>,
    driver_task: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketTransport {
    pub fn new(config: WebSocketConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            sink: std::sync::Arc::new(Mutex::new(None)),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
            connected: AtomicBool::new(false),
            generation: std::sync::Arc::new(AtomicU64::new(0)),
            driver_task: Mutex::new(None),
        }
    }

    fn set_connected(&self, value: bool) {
        self.connected.store(value, Ordering::Release);
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut request = self
            .config
            .url
            .clone()
            .into_client_request()
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        for (key, value) in &self.config.headers {
            if let (Ok(name), Ok(val)) = (
                tokio_tungstenite::tungstenite::http::HeaderName::try_from(key.as_str()),
                tokio_tungstenite::tungstenite::http::HeaderValue::try_from(value.as_str()),
            ) {
                request.headers_mut().insert(name, val);
            }
        }

        let (stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        let (sink, read) = stream.split();

        *self.sink.lock().await = Some(sink);
        self.set_connected(true);
        let _ = self.events_tx.send(TransportEvent::Connect);

        let events_tx = self.events_tx.clone();
        let generation = self.generation.clone();
        let my_generation = generation.load(Ordering::SeqCst);
        let max_attempts = self.config.max_reconnect_attempts;
        let base_delay = Duration::from_millis(self.config.reconnect_delay_ms);
        let url = self.config.url.clone();
        let headers = self.config.headers.clone();
        let shared_sink = self.sink.clone();

        let task = tokio::spawn(async move {
            let mut read = read;
            let mut attempts: u32 = 0;
            loop {
                let (code, reason) = drain_until_close(&mut read, &events_tx).await;
                if generation.load(Ordering::SeqCst) != my_generation {
                    // Caller closed us deliberately; don't race a reconnect.
                    return;
                }
                let terminal = code.map(is_terminal_close).unwrap_or(false);
                if terminal || attempts >= max_attempts {
                    let _ = events_tx.send(TransportEvent::Disconnect { code, reason });
                    return;
                }
                attempts += 1;
                let delay = base_delay * 2u32.saturating_pow(attempts - 1);
                tokio::time::sleep(delay).await;
                if generation.load(Ordering::SeqCst) != my_generation {
                    return;
                }

                let Ok(mut req) = url.clone().into_client_request() else {
                    let _ = events_tx.send(TransportEvent::Error(
                        "failed to rebuild reconnect request".into(),
                    ));
                    return;
                };
                for (key, value) in &headers {
                    if let (Ok(name), Ok(val)) = (
                        tokio_tungstenite::tungstenite::http::HeaderName::try_from(key.as_str()),
                        tokio_tungstenite::tungstenite::http::HeaderValue::try_from(
                            value.as_str(),
                        ),
                    ) {
                        req.headers_mut().insert(name, val);
                    }
                }
                match tokio_tungstenite::connect_async(req).await {
                    Ok((stream, _)) => {
                        let (new_sink, new_read) = stream.split();
                        *shared_sink.lock().await = Some(new_sink);
                        read = new_read;
                        attempts = 0;
                        let _ = events_tx.send(TransportEvent::Connect);
                    }
                    Err(err) => {
                        let _ = events_tx.send(TransportEvent::Error(err.to_string()));
                    }
                }
            }
        });

        *self.driver_task.lock().await = Some(task);
        Ok(())
    }

    async fn send(&self, message: &Message) -> Result<(), TransportError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;
        let text = message.to_wire()?;
        sink.send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.set_connected(false);

        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink
                .send(WsMessage::Close(Some(CloseFrame {
                    code: 1000u16.into(),
                    reason: "client closing".into(),
                })))
                .await;
            let _ = sink.close().await;
        }
        if let Some(task) = self.driver_task.lock().await.take() {
            task.abort();
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events_rx.try_lock().ok()?.take()
    }
}

use tokio_tungstenite::tungstenite::client::IntoClientRequest;

/// Drain frames until the stream closes or errors, forwarding each as a
/// [`TransportEvent`]. Returns the close code/reason if one was given.
async fn drain_until_close<S>(
    stream: &mut futures_util::stream::SplitStream<tokio_tungstenite::WebSocketStream<S>>,
    events_tx: &mpsc::UnboundedSender<TransportEvent>,
) -> (Option<u16>, Option<String>)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                let event = match Message::from_wire(&text) {
                    Ok(message) => TransportEvent::Message(message),
                    Err(err) => TransportEvent::Error(err.to_string()),
                };
                if events_tx.send(event).is_err() {
                    return (None, None);
                }
            }
            Ok(WsMessage::Close(frame)) => {
                return (
                    frame.as_ref().map(|f| f.code.into()),
                    frame.map(|f| f.reason.to_string()),
                );
            }
            Ok(_) => {}
            Err(err) => {
                let _ = events_tx.send(TransportEvent::Error(err.to_string()));
                return (None, Some(err.to_string()));
            }
        }
    }
    (None, Some("stream ended".into()))
}

#[cfg(test)]
#[path = "websocket_tests.rs"]
mod tests;
