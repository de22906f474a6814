// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::mcp::transport::TransportConfig;

#[test]
fn parses_basic_stdio_server() {
    let json = r#"
    {
        "servers": {
            "filesystem": {
                "type": "stdio",
                "command": "mcp-fs-server",
                "args": ["--root", "/tmp"]
            }
        }
    }
    "#;

    let config = McpConfig::parse(json).unwrap();
    assert!(config.servers.contains_key("filesystem"));
    let entry = &config.servers["filesystem"];
    assert_eq!(entry.timeout_ms, default_timeout_ms());
    assert!(matches!(entry.transport, TransportConfig::Stdio(_)));
}

#[test]
fn parses_json5_with_comments_and_trailing_commas() {
    let json5 = r#"
    {
        // inline comment
        "servers": {
            "ws": {
                "type": "websocket",
                "url": "ws://localhost:9001",
            },
        },
    }
    "#;

    let config = McpConfig::parse(json5).unwrap();
    assert!(config.servers.contains_key("ws"));
}

#[test]
fn custom_timeout_overrides_default() {
    let json = r#"
    {
        "servers": {
            "http": {
                "type": "http",
                "url": "http://localhost:9002/mcp",
                "timeoutMs": 5000
            }
        }
    }
    "#;

    let config = McpConfig::parse(json).unwrap();
    assert_eq!(config.servers["http"].timeout_ms, 5000);
}

#[test]
fn merge_combines_distinct_servers() {
    let a = McpConfig::parse(r#"{"servers":{"a":{"type":"stdio","command":"a"}}}"#).unwrap();
    let b = McpConfig::parse(r#"{"servers":{"b":{"type":"stdio","command":"b"}}}"#).unwrap();
    let merged = McpConfig::merge([a, b]);
    assert_eq!(merged.servers.len(), 2);
}

#[test]
fn merge_lets_later_config_win_on_name_collision() {
    let a = McpConfig::parse(r#"{"servers":{"x":{"type":"stdio","command":"old"}}}"#).unwrap();
    let b = McpConfig::parse(r#"{"servers":{"x":{"type":"stdio","command":"new"}}}"#).unwrap();
    let merged = McpConfig::merge([a, b]);
    match &merged.servers["x"].transport {
        TransportConfig::Stdio(cfg) => assert_eq!(cfg.command, "new"),
        other => panic!("expected stdio, got {other:?}"),
    }
}

#[test]
fn server_names_lists_keys() {
    let config = McpConfig::parse(
        r#"{"servers":{"a":{"type":"stdio","command":"a"},"b":{"type":"stdio","command":"b"}}}"#,
    )
    .unwrap();
    let mut names = config.server_names();
    names.sort();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn has_servers_reports_emptiness() {
    assert!(!McpConfig::default().has_servers());
}

#[test]
fn malformed_config_reports_parse_error() {
    let err = McpConfig::parse("{ not json").unwrap_err();
    assert!(matches!(err, McpConfigError::Parse(_)));
}

#[test]
fn load_mcp_config_treats_brace_prefixed_input_as_inline() {
    let config = load_mcp_config(r#"{"servers":{}}"#).unwrap();
    assert!(!config.has_servers());
}

#[test]
fn load_mcp_config_reports_io_error_for_missing_file() {
    let err = load_mcp_config("/no/such/path/mcp.json5").unwrap_err();
    assert!(matches!(err, McpConfigError::Io(_, _)));
}

#[test]
fn server_config_serializes_camelcase_with_capability_flags() {
    let config = ServerConfig {
        name: "demo".into(),
        version: "1.0.0".into(),
        description: Some("demo server".into()),
        author: None,
        homepage: None,
        capabilities: ServerCapabilityFlags {
            resources: true,
            tools: true,
            prompts: false,
            logging: false,
        },
    };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["capabilities"]["resources"], serde_json::json!(true));
    assert!(json.get("author").is_none());
}
