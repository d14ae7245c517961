// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry events emitted by the relay.
//!
//! Events are informational. Nothing in the relay waits on a subscriber and a
//! lagging subscriber only loses events.

use serde::Serialize;

use crate::endpoint::EndpointId;
use crate::relay::RelayResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A connection registered as the device.
    DeviceRegistered { endpoint: EndpointId },
    /// A previous device lost its registration to a newer one.
    DeviceEvicted { endpoint: EndpointId, closed: bool },
    /// The registered device disconnected.
    DeviceDisconnected { endpoint: EndpointId },
    /// A relay attempt and its outcome.
    Relay { outcome: RelayResult, text: String },
    /// A payload was written to the mailbox.
    Published { text: String },
}
