#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::mcp::config::ServerCapabilityFlags;
use crate::mcp::transport::{StdioConfig, StdioTransport};
use std::sync::Arc;

fn demo_config() -> ServerConfig {
    ServerConfig {
        name: "echo".into(),
        version: "1.0.0".into(),
        description: None,
        author: None,
        homepage: None,
        capabilities: ServerCapabilityFlags {
            resources: false,
            tools: true,
            prompts: false,
            logging: false,
        },
    }
}

fn echo_server_script() -> StdioConfig {
    StdioConfig {
        command: "python3".into(),
        args: vec![
            "-c".into(),
            r#"
import json
import sys

for line in sys.stdin:
    line = line.strip()
    if not line:
        continue
    req = json.loads(line)
    method = req.get("method", "")
    req_id = req.get("id")

    if method == "initialize":
        result = {
            "protocolVersion": "2024-11-05",
            "capabilities": {"resources": False, "tools": True, "prompts": False, "logging": False},
            "serverInfo": {"name": "echo", "version": "1.0.0"},
        }
    elif method == "notifications/initialized":
        continue
    elif method == "tools/list":
        result = {
            "tools": [
                {"name": "add", "description": "adds numbers", "inputSchema": {"type": "object"}}
            ]
        }
    elif method == "tools/call":
        params = req.get("params", {})
        if params.get("name") == "boom":
            resp = {
                "jsonrpc": "2.0",
                "id": req_id,
                "error": {"code": -32002, "message": "Tool execution failed: boom", "data": {"tool": "boom"}},
            }
            print(json.dumps(resp), flush=True)
            continue
        result = {"content": [{"type": "text", "text": json.dumps(params.get("arguments", {}))}], "isError": False}
    elif method == "never-reply":
        continue
    else:
        result = {}

    if req_id is not None:
        resp = {"jsonrpc": "2.0", "id": req_id, "result": result}
        print(json.dumps(resp), flush=True)
"#
            .into(),
        ],
        env: Default::default(),
        cwd: None,
    }
}

async fn connected_hub() -> (Arc<ClientHub>, &'static str) {
    let hub = ClientHub::new(ClientInfo {
        name: "metis-mcp-tests".into(),
        version: "0.1.0".into(),
    });
    let transport = StdioTransport::new(echo_server_script());
    transport.connect().await.unwrap();
    let connection: Arc<dyn Transport> = Arc::new(transport);
    hub.register_server("echo", demo_config(), connection, None)
        .await
        .unwrap();
    (hub, "echo")
}

#[tokio::test]
async fn connects_and_initializes() {
    let (hub, server_id) = connected_hub().await;
    assert_eq!(hub.server_status(server_id).await, Some(ServerStatus::Connected));
    hub.disconnect().await;
}

#[tokio::test]
async fn discovers_tools() {
    let (hub, server_id) = connected_hub().await;
    let tools = hub.list_tools(server_id).await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "add");
    hub.disconnect().await;
}

#[tokio::test]
async fn calls_tool() {
    let (hub, server_id) = connected_hub().await;
    let result = hub
        .call_tool(
            server_id,
            ToolCall {
                name: "add".into(),
                arguments: serde_json::json!({"a": 1, "b": 2}),
            },
        )
        .await
        .unwrap();
    assert!(!result.is_error);
    hub.disconnect().await;
}

#[tokio::test]
async fn tool_error_surfaces_server_message() {
    let (hub, server_id) = connected_hub().await;
    let err = hub
        .call_tool(
            server_id,
            ToolCall {
                name: "boom".into(),
                arguments: serde_json::json!({}),
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("boom"));
    hub.disconnect().await;
}

#[tokio::test]
async fn unknown_server_id_is_rejected() {
    let hub = ClientHub::new(ClientInfo {
        name: "metis-mcp-tests".into(),
        version: "0.1.0".into(),
    });
    let err = hub.list_tools("does-not-exist").await.unwrap_err();
    assert!(matches!(err, ClientError::UnknownServer(_)));
}

#[tokio::test]
async fn request_times_out_when_server_never_replies() {
    let hub = ClientHub::new(ClientInfo {
        name: "metis-mcp-tests".into(),
        version: "0.1.0".into(),
    });
    let transport = StdioTransport::new(echo_server_script());
    transport.connect().await.unwrap();
    let connection: Arc<dyn Transport> = Arc::new(transport);
    hub.register_server("echo", demo_config(), connection, Some(50))
        .await
        .unwrap();

    let err = hub.send_request("echo", "never-reply", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)));
    hub.disconnect().await;
}

#[tokio::test]
async fn disconnect_empties_pending_table() {
    let (hub, _server_id) = connected_hub().await;
    hub.disconnect().await;
    assert!(hub.pending.lock().await.is_empty());
}
