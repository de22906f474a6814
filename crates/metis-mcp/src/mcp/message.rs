// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC 2.0 message envelope shared by every MCP transport.
//!
//! Every wire object carries `jsonrpc = "2.0"` and is exactly one of a
//! [`Request`], a [`Response`], or a [`Notification`]. Classification follows
//! the rule in the protocol: `id` present with `method` is a request, `id`
//! present with `result`/`error` is a response, and no `id` with `method` is
//! a notification.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A JSON-RPC request/response identifier: either a string or a number.
///
/// Servers in the wild echo back whichever shape the client sent, so this
/// is kept as an enum rather than collapsed into a single representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        RequestId::Number(n as i64)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s}"),
        }
    }
}

// ============================================================================
// Error codes
// ============================================================================

/// Standard JSON-RPC parse error.
pub const PARSE_ERROR: i64 = -32700;
/// Request was malformed.
pub const INVALID_REQUEST: i64 = -32600;
/// Requested method does not exist or is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;
/// Generic server error.
pub const SERVER_ERROR: i64 = -32000;
/// No provider produced a resource for the requested URI.
pub const RESOURCE_NOT_FOUND: i64 = -32001;
/// A tool's execution raised an error.
pub const TOOL_ERROR: i64 = -32002;
/// A security policy rejected the operation.
pub const SECURITY_ERROR: i64 = -32003;
/// A transport-level connection failure.
pub const CONNECTION_ERROR: i64 = -32004;

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal_error(method: &str, message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message).with_data(serde_json::json!({ "method": method }))
    }

    pub fn tool_error(tool: &str, message: impl Into<String>) -> Self {
        Self::new(TOOL_ERROR, message).with_data(serde_json::json!({ "tool": tool }))
    }

    pub fn resource_not_found(uri: &str) -> Self {
        Self::new(RESOURCE_NOT_FOUND, format!("Resource not found: {uri}"))
    }
}

// ============================================================================
// Wire envelope
// ============================================================================

/// The raw, uninterpreted shape every message takes on the wire. Used purely
/// as a serde intermediate; callers work with [`Message`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMessage {
    jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorObject>,
}

/// A JSON-RPC request: has an `id` and a `method`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Value>,
}

/// A JSON-RPC response: has an `id` matching a prior request, and exactly
/// one of `result`/`error`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMessage {
    pub id: RequestId,
    pub outcome: Result<Value, ErrorObject>,
}

/// A JSON-RPC notification: has a `method`, no `id`, no reply expected.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub method: String,
    pub params: Option<Value>,
}

/// A classified JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(RequestMessage),
    Response(ResponseMessage),
    Notification(NotificationMessage),
}

/// Errors encountered while decoding a wire message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed JSON-RPC message: neither a request, response, nor notification")]
    Malformed,

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Message {
    pub fn request(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Message::Request(RequestMessage {
            id,
            method: method.into(),
            params,
        })
    }

    pub fn response_ok(id: RequestId, result: Value) -> Self {
        Message::Response(ResponseMessage {
            id,
            outcome: Ok(result),
        })
    }

    pub fn response_err(id: RequestId, error: ErrorObject) -> Self {
        Message::Response(ResponseMessage {
            id,
            outcome: Err(error),
        })
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Message::Notification(NotificationMessage {
            method: method.into(),
            params,
        })
    }

    /// Parse a single line/frame of wire text into a classified message.
    pub fn from_wire(text: &str) -> Result<Self, MessageError> {
        let raw: RawMessage = serde_json::from_str(text)?;
        Message::try_from(raw)
    }

    /// Serialize this message to its wire JSON text (no trailing newline).
    pub fn to_wire(&self) -> Result<String, MessageError> {
        let raw = RawMessage::from(self.clone());
        Ok(serde_json::to_string(&raw)?)
    }
}

impl TryFrom<RawMessage> for Message {
    type Error = MessageError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        match (raw.id, raw.method, raw.result, raw.error) {
            (Some(id), Some(method), _, _) => Ok(Message::Request(RequestMessage {
                id,
                method,
                params: raw.params,
            })),
            (Some(id), None, result, error) => {
                let outcome = match error {
                    Some(err) => Err(err),
                    None => Ok(result.unwrap_or(Value::Null)),
                };
                Ok(Message::Response(ResponseMessage { id, outcome }))
            }
            (None, Some(method), _, _) => Ok(Message::Notification(NotificationMessage {
                method,
                params: raw.params,
            })),
            (None, None, _, _) => Err(MessageError::Malformed),
        }
    }
}

impl From<Message> for RawMessage {
    fn from(message: Message) -> Self {
        let mut raw = RawMessage {
            jsonrpc: Some("2.0".to_string()),
            ..Default::default()
        };
        match message {
            Message::Request(req) => {
                raw.id = Some(req.id);
                raw.method = Some(req.method);
                raw.params = req.params;
            }
            Message::Response(resp) => {
                raw.id = Some(resp.id);
                match resp.outcome {
                    Ok(result) => raw.result = Some(result),
                    Err(error) => raw.error = Some(error),
                }
            }
            Message::Notification(notif) => {
                raw.method = Some(notif.method);
                raw.params = notif.params;
            }
        }
        raw
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        RawMessage::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawMessage::deserialize(deserializer)?;
        Message::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
