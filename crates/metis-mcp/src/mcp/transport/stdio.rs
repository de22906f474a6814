// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stdio transport: spawns a child process, speaks newline-delimited
//! JSON-RPC over its stdin/stdout, and forwards stderr as out-of-band
//! [`TransportEvent::Stderr`] events.
//!
//! Shutdown escalates: SIGTERM, a 5s grace period, then SIGKILL if the
//! child is still alive after 2 more seconds.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::{Transport, TransportError, TransportEvent};
use crate::mcp::message::Message;

const TERM_GRACE: Duration = Duration::from_secs(5);
const KILL_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StdioConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

pub struct StdioTransport {
    config: StdioConfig,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<BufWriter<ChildStdin>>>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<TransportEvent>>>,
    connected: std::sync::atomic::AtomicBool,
    reader_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl StdioTransport {
    pub fn new(config: StdioConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
            connected: std::sync::atomic::AtomicBool::new(false),
            reader_tasks: Mutex::new(Vec::new()),
        }
    }

    fn set_connected(&self, value: bool) {
        self.connected
            .store(value, std::sync::atomic::Ordering::Release);
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &self.config.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| TransportError::Spawn(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Spawn("child stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Spawn("child stdout unavailable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TransportError::Spawn("child stderr unavailable".into()))?;

        *self.stdin.lock().await = Some(BufWriter::new(stdin));
        *self.child.lock().await = Some(child);
        self.set_connected(true);

        let stdout_tx = self.events_tx.clone();
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let event = match Message::from_wire(&line) {
                            Ok(message) => TransportEvent::Message(message),
                            Err(err) => TransportEvent::Error(err.to_string()),
                        };
                        if stdout_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = stdout_tx.send(TransportEvent::Disconnect {
                            code: None,
                            reason: Some("child process closed stdout".into()),
                        });
                        break;
                    }
                    Err(err) => {
                        let _ = stdout_tx.send(TransportEvent::Error(err.to_string()));
                        break;
                    }
                }
            }
        });

        let stderr_tx = self.events_tx.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if stderr_tx.send(TransportEvent::Stderr(line)).is_err() {
                    break;
                }
            }
        });

        self.reader_tasks
            .lock()
            .await
            .extend([stdout_task, stderr_task]);

        let _ = self.events_tx.send(TransportEvent::Connect);
        Ok(())
    }

    async fn send(&self, message: &Message) -> Result<(), TransportError> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard.as_mut().ok_or(TransportError::NotConnected)?;
        let text = message.to_wire()?;
        stdin.write_all(text.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.set_connected(false);
        // Step 1: close stdin and give the child a chance to exit on EOF.
        self.stdin.lock().await.take();

        let mut guard = self.child.lock().await;
        let Some(mut child) = guard.take() else {
            return Ok(());
        };

        if let Some(id) = child.id() {
            let pid = Pid::from_raw(id as i32);

            // Step 2: still alive after the grace period, escalate to SIGTERM.
            if timeout(TERM_GRACE, child.wait()).await.is_err() {
                let _ = signal::kill(pid, Signal::SIGTERM);

                // Step 3: still alive after another grace period, SIGKILL.
                if timeout(KILL_GRACE, child.wait()).await.is_err() {
                    let _ = signal::kill(pid, Signal::SIGKILL);
                    let _ = child.wait().await;
                }
            }
        } else {
            let _ = child.kill().await;
        }

        for task in self.reader_tasks.lock().await.drain(..) {
            task.abort();
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(std::sync::atomic::Ordering::Acquire)
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events_rx.try_lock().ok()?.take()
    }
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;
