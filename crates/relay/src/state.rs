// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::endpoint::{EndpointHandle, EndpointId};
use crate::events::RelayEvent;
use crate::firmware::FirmwareStore;
use crate::mailbox::{Mailbox, MailboxPolicy};
use crate::registry::{EvictPolicy, Registration, Registry};
use crate::relay::{self, RelayResult};

/// Shared relay state passed to all handlers via axum `State` extractor.
///
/// The registry and mailbox are only reachable through the methods below.
/// Their locks are never held across an `.await`.
pub struct RelayState {
    pub config: RelayConfig,
    pub shutdown: CancellationToken,
    pub firmware: FirmwareStore,
    pub event_tx: broadcast::Sender<RelayEvent>,
    registry: Mutex<Registry>,
    mailbox: Mutex<Mailbox>,
    next_endpoint: AtomicU64,
}

impl RelayState {
    pub fn new(config: RelayConfig, shutdown: CancellationToken) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            firmware: FirmwareStore::new(config.firmware_dir()),
            registry: Mutex::new(Registry::new(config.registration_token.clone(), config.evict)),
            mailbox: Mutex::new(Mailbox::new(config.mailbox_policy)),
            next_endpoint: AtomicU64::new(1),
            event_tx,
            config,
            shutdown,
        }
    }

    /// Allocate a handle for a newly opened connection.
    pub fn open_endpoint(&self) -> (EndpointHandle, mpsc::UnboundedReceiver<String>) {
        let id = self.next_endpoint.fetch_add(1, Ordering::Relaxed);
        EndpointHandle::new(id)
    }

    // -- Registry -------------------------------------------------------------

    pub fn register_if_device(&self, endpoint: &EndpointHandle, first_message: &str) -> bool {
        let registration = self.registry.lock().register_if_device(endpoint, first_message);
        if let Registration::Registered { evicted } = registration {
            if let Some(old) = evicted {
                let closed = self.evict_policy() == EvictPolicy::Close;
                tracing::info!(endpoint = old, replaced_by = endpoint.id, closed, "device evicted");
                self.emit(RelayEvent::DeviceEvicted { endpoint: old, closed });
            }
            tracing::info!(endpoint = endpoint.id, "device registered");
            self.emit(RelayEvent::DeviceRegistered { endpoint: endpoint.id });
        }
        registration.is_registered()
    }

    /// Connection teardown. Safe to call for any endpoint, any number of times.
    pub fn on_close(&self, endpoint: EndpointId) {
        if self.registry.lock().on_close(endpoint) {
            tracing::info!(endpoint, "device disconnected");
            self.emit(RelayEvent::DeviceDisconnected { endpoint });
        } else {
            tracing::debug!(endpoint, "client disconnected");
        }
    }

    pub fn device_id(&self) -> Option<EndpointId> {
        self.registry.lock().device_id()
    }

    pub fn device_connected(&self) -> bool {
        self.registry.lock().device().is_some_and(EndpointHandle::is_open)
    }

    pub fn evict_policy(&self) -> EvictPolicy {
        self.config.evict
    }

    // -- Router ---------------------------------------------------------------

    pub fn relay(&self, text: &str) -> RelayResult {
        let outcome = relay::route(self.registry.lock().device(), text);
        match outcome {
            RelayResult::Delivered => tracing::info!(text, "sent to device"),
            RelayResult::NoDevice => {
                tracing::warn!(text, "no device connected, dropping message")
            }
        }
        self.emit(RelayEvent::Relay { outcome, text: text.to_owned() });
        outcome
    }

    // -- Mailbox --------------------------------------------------------------

    pub fn publish(&self, text: &str) {
        self.mailbox.lock().publish(text);
        self.emit(RelayEvent::Published { text: text.to_owned() });
    }

    pub fn consume(&self) -> Option<String> {
        self.mailbox.lock().consume()
    }

    pub fn mailbox_policy(&self) -> MailboxPolicy {
        self.mailbox.lock().policy()
    }

    /// Accept a controller submission: fill the mailbox, then push to the device.
    pub fn submit(&self, text: &str) -> RelayResult {
        self.publish(text);
        self.relay(text)
    }

    fn emit(&self, event: RelayEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
