// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unwrap/expect/panic ONLY in test code
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Model Context Protocol client/server hub.
//!
//! `metis-mcp` is a bidirectional implementation of the Model Context
//! Protocol: a [`mcp::client::ClientHub`] that registers, initializes, and
//! routes requests to several MCP servers concurrently over pluggable
//! transports, and a [`mcp::server::ServerHub`] that multiplexes provider
//! plugins behind a capability-gated JSON-RPC dispatcher.
//!
//! See [`mcp`] for the full module layout.

pub mod mcp;
