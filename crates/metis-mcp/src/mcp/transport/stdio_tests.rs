// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::mcp::message::RequestId;
use std::time::Duration;

fn cat_config() -> StdioConfig {
    StdioConfig {
        command: "cat".to_string(),
        args: Vec::new(),
        env: HashMap::new(),
        cwd: None,
    }
}

#[tokio::test]
async fn connect_spawns_process_and_reports_connected() {
    let transport = StdioTransport::new(cat_config());
    transport.connect().await.unwrap();
    assert!(transport.is_connected().await);
    transport.close().await.unwrap();
}

#[tokio::test]
async fn spawn_failure_reports_error() {
    let transport = StdioTransport::new(StdioConfig {
        command: "this-binary-does-not-exist-anywhere".to_string(),
        args: Vec::new(),
        env: HashMap::new(),
        cwd: None,
    });
    let err = transport.connect().await.unwrap_err();
    assert!(matches!(err, TransportError::Spawn(_)));
}

#[tokio::test]
async fn echoed_message_arrives_as_transport_event() {
    let transport = StdioTransport::new(cat_config());
    let mut events = transport.take_events().unwrap();
    transport.connect().await.unwrap();

    let message = Message::request(RequestId::Number(1), "ping", None);
    transport.send(&message).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        TransportEvent::Connect => {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(event, TransportEvent::Message(m) if m == message));
        }
        TransportEvent::Message(m) => assert_eq!(m, message),
        other => panic!("unexpected event: {other:?}"),
    }
    transport.close().await.unwrap();
}

#[tokio::test]
async fn partial_line_across_writes_parses_once_on_newline() {
    // The child writes the JSON object in two separate chunks with a pause
    // between them; the line buffer must hold the partial fragment until
    // the newline arrives and parse exactly once.
    let transport = StdioTransport::new(StdioConfig {
        command: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            "printf '{\"jsonrpc\":\"2.0\",'; sleep 0.05; printf '\"id\":1,\"result\":{}}\\n'".to_string(),
        ],
        env: HashMap::new(),
        cwd: None,
    });
    let mut events = transport.take_events().unwrap();
    transport.connect().await.unwrap();

    let mut message = None;
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_secs(2), events.recv()).await
    {
        if let TransportEvent::Message(m) = event {
            message = Some(m);
            break;
        }
    }
    match message.expect("expected a parsed message event") {
        Message::Response(resp) => assert_eq!(resp.id, RequestId::Number(1)),
        other => panic!("unexpected message: {other:?}"),
    }
    transport.close().await.unwrap();
}

#[tokio::test]
async fn take_events_returns_none_on_second_call() {
    let transport = StdioTransport::new(cat_config());
    assert!(transport.take_events().is_some());
    assert!(transport.take_events().is_none());
}

#[tokio::test]
async fn close_before_connect_is_a_no_op() {
    let transport = StdioTransport::new(cat_config());
    transport.close().await.unwrap();
    assert!(!transport.is_connected().await);
}

#[tokio::test]
async fn send_without_connect_reports_not_connected() {
    let transport = StdioTransport::new(cat_config());
    let message = Message::notification("ping", None);
    let err = transport.send(&message).await.unwrap_err();
    assert!(matches!(err, TransportError::NotConnected));
}
