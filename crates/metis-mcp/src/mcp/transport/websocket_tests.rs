// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;

fn config(url: &str) -> WebSocketConfig {
    WebSocketConfig {
        url: url.to_string(),
        headers: HashMap::new(),
        reconnect_delay_ms: 10,
        max_reconnect_attempts: 2,
    }
}

#[test]
fn terminal_close_codes_suppress_reconnect() {
    assert!(is_terminal_close(1000));
    assert!(is_terminal_close(1008));
    assert!(!is_terminal_close(1006));
    assert!(!is_terminal_close(1011));
}

#[test]
fn default_reconnect_policy_is_bounded() {
    assert_eq!(default_reconnect_delay_ms(), 1_000);
    assert_eq!(default_max_reconnect_attempts(), 3);
}

#[tokio::test]
async fn connect_to_unreachable_host_reports_error() {
    let transport = WebSocketTransport::new(config("ws://127.0.0.1:1/no-such-port"));
    let err = transport.connect().await.unwrap_err();
    assert!(matches!(err, TransportError::WebSocket(_)));
}

#[tokio::test]
async fn send_without_connect_reports_not_connected() {
    let transport = WebSocketTransport::new(config("ws://127.0.0.1:9/unused"));
    let message = Message::notification("ping", None);
    let err = transport.send(&message).await.unwrap_err();
    assert!(matches!(err, TransportError::NotConnected));
}

#[tokio::test]
async fn take_events_returns_none_on_second_call() {
    let transport = WebSocketTransport::new(config("ws://127.0.0.1:9/unused"));
    assert!(transport.take_events().is_some());
    assert!(transport.take_events().is_none());
}

#[tokio::test]
async fn close_before_connect_is_a_no_op() {
    let transport = WebSocketTransport::new(config("ws://127.0.0.1:9/unused"));
    transport.close().await.unwrap();
    assert!(!transport.is_connected().await);
}
