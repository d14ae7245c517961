// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire-and-forget routing of controller payloads to the device.

use serde::Serialize;

use crate::endpoint::EndpointHandle;

/// Outcome of one relay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayResult {
    /// Queued on an open device connection.
    Delivered,
    /// No device registered, or its connection is no longer writable.
    NoDevice,
}

impl RelayResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::NoDevice => "no_device",
        }
    }
}

/// Send `text` to `device` verbatim. No ack, no retry, no buffering.
pub fn route(device: Option<&EndpointHandle>, text: &str) -> RelayResult {
    match device {
        Some(device) if device.is_open() && device.send(text) => RelayResult::Delivered,
        _ => RelayResult::NoDevice,
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
