// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;

#[test]
fn initialize_params_default_enables_all_but_logging() {
    let params = InitializeParams::new(ClientInfo {
        name: "metis".into(),
        version: "0.1.0".into(),
    });
    assert_eq!(params.protocol_version, PROTOCOL_VERSION);
    assert!(params.capabilities.resources);
    assert!(params.capabilities.tools);
    assert!(params.capabilities.prompts);
    assert!(!params.capabilities.logging);
}

#[test]
fn tool_result_error_sets_is_error_flag() {
    let result = ToolResult::error("boom");
    assert!(result.is_error);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["isError"], serde_json::json!(true));
}

#[test]
fn tool_result_success_omits_is_error_field() {
    let result = ToolResult::text("3");
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("isError").is_none());
}

#[test]
fn content_item_text_round_trips() {
    let item = ContentItem::Text {
        text: "hello".into(),
    };
    let json = serde_json::to_string(&item).unwrap();
    assert_eq!(json, r#"{"type":"text","text":"hello"}"#);
    let back: ContentItem = serde_json::from_str(&json).unwrap();
    assert!(matches!(back, ContentItem::Text { text } if text == "hello"));
}

#[test]
fn resource_content_serializes_camelcase_mime_type() {
    let content = ResourceContent {
        uri: "file:///a".into(),
        mime_type: Some("text/plain".into()),
        text: Some("hi".into()),
        blob: None,
    };
    let json = serde_json::to_value(&content).unwrap();
    assert_eq!(json["mimeType"], serde_json::json!("text/plain"));
    assert!(json.get("blob").is_none());
}

#[test]
fn prompt_message_role_serializes_lowercase() {
    let msg = PromptMessage {
        role: Role::Assistant,
        content: ContentItem::Text {
            text: "hi".into(),
        },
    };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["role"], serde_json::json!("assistant"));
}
