// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use proptest::prelude::*;

#[test]
fn classifies_request_by_id_and_method() {
    let msg = Message::from_wire(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
    match msg {
        Message::Request(req) => {
            assert_eq!(req.id, RequestId::Number(1));
            assert_eq!(req.method, "tools/list");
        }
        other => panic!("expected Request, got {other:?}"),
    }
}

#[test]
fn classifies_response_with_result() {
    let msg = Message::from_wire(r#"{"jsonrpc":"2.0","id":"abc","result":{"ok":true}}"#).unwrap();
    match msg {
        Message::Response(resp) => {
            assert_eq!(resp.id, RequestId::String("abc".into()));
            assert_eq!(resp.outcome.unwrap(), serde_json::json!({"ok": true}));
        }
        other => panic!("expected Response, got {other:?}"),
    }
}

#[test]
fn classifies_response_with_error() {
    let msg = Message::from_wire(
        r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"nope"}}"#,
    )
    .unwrap();
    match msg {
        Message::Response(resp) => {
            let err = resp.outcome.unwrap_err();
            assert_eq!(err.code, METHOD_NOT_FOUND);
            assert_eq!(err.message, "nope");
        }
        other => panic!("expected Response, got {other:?}"),
    }
}

#[test]
fn classifies_notification_without_id() {
    let msg =
        Message::from_wire(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
    match msg {
        Message::Notification(n) => assert_eq!(n.method, "notifications/initialized"),
        other => panic!("expected Notification, got {other:?}"),
    }
}

#[test]
fn message_with_neither_id_nor_method_is_malformed() {
    let err = Message::from_wire(r#"{"jsonrpc":"2.0"}"#).unwrap_err();
    assert!(matches!(err, MessageError::Malformed));
}

#[test]
fn round_trips_through_wire_text() {
    let original = Message::request(
        RequestId::Number(7),
        "tools/call",
        Some(serde_json::json!({"name": "add"})),
    );
    let text = original.to_wire().unwrap();
    let parsed = Message::from_wire(&text).unwrap();
    assert_eq!(original, parsed);
}

#[test]
fn request_serialization_omits_absent_params() {
    let msg = Message::request(RequestId::Number(1), "ping", None);
    let text = msg.to_wire().unwrap();
    assert!(!text.contains("params"));
}

#[test]
fn notification_has_no_id_field() {
    let msg = Message::notification("notifications/initialized", None);
    let text = msg.to_wire().unwrap();
    assert!(!text.contains("\"id\""));
}

#[test]
fn error_object_helpers_set_expected_codes() {
    assert_eq!(ErrorObject::method_not_found("foo").code, METHOD_NOT_FOUND);
    assert_eq!(ErrorObject::invalid_params("bad").code, INVALID_PARAMS);
    assert_eq!(
        ErrorObject::internal_error("tools/call", "boom").data,
        Some(serde_json::json!({"method": "tools/call"}))
    );
    assert_eq!(
        ErrorObject::tool_error("add", "boom").data,
        Some(serde_json::json!({"tool": "add"}))
    );
}

proptest! {
    /// `to_wire` → `from_wire` is the identity on any request id/method/params
    /// combination, per spec.md §8's round-trip law.
    #[test]
    fn request_round_trips_for_any_id_and_method(
        id in 0i64..1_000_000,
        method in "[a-z]+(/[a-z]+)?",
        value in 0i64..1_000,
    ) {
        let original = Message::request(
            RequestId::Number(id),
            &method,
            Some(serde_json::json!({ "n": value })),
        );
        let text = original.to_wire().unwrap();
        let parsed = Message::from_wire(&text).unwrap();
        prop_assert_eq!(original, parsed);
    }

    #[test]
    fn string_request_id_round_trips(id in "[a-zA-Z0-9_-]{1,20}") {
        let original = Message::request(RequestId::String(id), "ping", None);
        let text = original.to_wire().unwrap();
        let parsed = Message::from_wire(&text).unwrap();
        prop_assert_eq!(original, parsed);
    }
}
