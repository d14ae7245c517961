// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-slot registry of the current device connection.

use serde::Serialize;

use crate::endpoint::{EndpointHandle, EndpointId};

/// Treatment of the previous device connection when a new one registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EvictPolicy {
    /// Drop the reference only; the stale socket stays open but receives nothing.
    Orphan,
    /// Drop the reference and close the stale socket.
    Close,
}

/// Result of offering a first message to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Not the registration token; treat the message as a payload.
    NotToken,
    /// Bound as the device, replacing `evicted` if there was one.
    Registered { evicted: Option<EndpointId> },
}

impl Registration {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }
}

/// Holds at most one device endpoint. Last registration wins.
#[derive(Debug)]
pub struct Registry {
    token: String,
    evict: EvictPolicy,
    device: Option<EndpointHandle>,
}

impl Registry {
    pub fn new(token: impl Into<String>, evict: EvictPolicy) -> Self {
        Self { token: token.into(), evict, device: None }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn evict_policy(&self) -> EvictPolicy {
        self.evict
    }

    /// Bind `endpoint` as the device if `first_message` is the registration token.
    pub fn register_if_device(
        &mut self,
        endpoint: &EndpointHandle,
        first_message: &str,
    ) -> Registration {
        if first_message.trim() != self.token {
            return Registration::NotToken;
        }

        let evicted = match self.device.replace(endpoint.clone()) {
            Some(old) if old.id != endpoint.id => {
                if self.evict == EvictPolicy::Close {
                    old.close();
                }
                Some(old.id)
            }
            _ => None,
        };
        Registration::Registered { evicted }
    }

    /// Clear the registry if `endpoint` is the current device. Returns whether it was.
    pub fn on_close(&mut self, endpoint: EndpointId) -> bool {
        if self.device_id() == Some(endpoint) {
            self.device = None;
            true
        } else {
            false
        }
    }

    pub fn device(&self) -> Option<&EndpointHandle> {
        self.device.as_ref()
    }

    pub fn device_id(&self) -> Option<EndpointId> {
        self.device.as_ref().map(|d| d.id)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
