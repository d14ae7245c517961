// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection endpoint state and the first-message role machine.
//!
//! Every WebSocket connection starts `Unclassified`. The first text it sends
//! moves it to `Device` (registration token) or `Controller` (anything else,
//! which is also relayed unless blank). The role never changes afterwards;
//! only disconnection ends it.

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::relay::RelayResult;
use crate::state::RelayState;

/// Process-unique connection identifier.
pub type EndpointId = u64;

/// Role of a connection in the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Unclassified,
    Device,
    Controller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::Device => "device",
            Self::Controller => "controller",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write side of a connection, shared with the registry.
///
/// Frames pushed into `tx` are written to the socket by the connection task.
/// Cancelling `close` asks that task to send a close frame and exit.
#[derive(Debug, Clone)]
pub struct EndpointHandle {
    pub id: EndpointId,
    tx: mpsc::UnboundedSender<String>,
    close: CancellationToken,
}

impl EndpointHandle {
    pub fn new(id: EndpointId) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx, close: CancellationToken::new() }, rx)
    }

    /// Whether the connection task is still accepting frames.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed() && !self.close.is_cancelled()
    }

    /// Queue a text frame. Returns false if the connection is gone.
    pub fn send(&self, text: &str) -> bool {
        if self.close.is_cancelled() {
            return false;
        }
        self.tx.send(text.to_owned()).is_ok()
    }

    /// Request the connection task to terminate.
    pub fn close(&self) {
        self.close.cancel();
    }

    pub fn closed_token(&self) -> CancellationToken {
        self.close.clone()
    }
}

/// What happened to one inbound text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// The connection became the registered device.
    Registered,
    /// The message was a controller payload and went through the router.
    Relayed(RelayResult),
    /// Nothing to do: blank text, or a message from a device connection.
    Ignored,
}

/// A live connection: its write handle plus its current role.
#[derive(Debug)]
pub struct Connection {
    handle: EndpointHandle,
    role: Role,
}

impl Connection {
    pub fn new(handle: EndpointHandle) -> Self {
        Self { handle, role: Role::Unclassified }
    }

    pub fn id(&self) -> EndpointId {
        self.handle.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn handle(&self) -> &EndpointHandle {
        &self.handle
    }

    /// Feed one received text message through the role machine.
    pub fn on_text(&mut self, state: &RelayState, raw: &str) -> Inbound {
        let text = raw.trim();

        match self.role {
            Role::Unclassified => {
                if state.register_if_device(&self.handle, text) {
                    self.role = Role::Device;
                    return Inbound::Registered;
                }
                self.role = Role::Controller;
                tracing::debug!(endpoint = self.handle.id, "classified as controller");
                self.forward(state, text)
            }
            Role::Controller => self.forward(state, text),
            Role::Device => {
                tracing::debug!(endpoint = self.handle.id, text, "ignoring message from device");
                Inbound::Ignored
            }
        }
    }

    fn forward(&self, state: &RelayState, text: &str) -> Inbound {
        if text.is_empty() {
            return Inbound::Ignored;
        }
        Inbound::Relayed(state.relay(text))
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
