// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Depth-1 mailbox for devices that poll instead of holding a socket.

use serde::Serialize;

/// How `consume` treats the pending value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MailboxPolicy {
    /// Return the pending value on every poll until the next publish.
    Peek,
    /// Return the pending value once, then clear the slot.
    Pop,
}

impl MailboxPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peek => "peek",
            Self::Pop => "pop",
        }
    }
}

/// Single-slot, last-value-wins store.
///
/// `text` is only meaningful while `pending` is set.
#[derive(Debug)]
pub struct Mailbox {
    policy: MailboxPolicy,
    text: String,
    pending: bool,
}

impl Mailbox {
    pub fn new(policy: MailboxPolicy) -> Self {
        Self { policy, text: String::new(), pending: false }
    }

    pub fn policy(&self) -> MailboxPolicy {
        self.policy
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Overwrite the slot, whether or not the previous value was consumed.
    pub fn publish(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.pending = true;
    }

    /// Read the slot according to the active policy.
    pub fn consume(&mut self) -> Option<String> {
        if !self.pending {
            return None;
        }
        match self.policy {
            MailboxPolicy::Peek => Some(self.text.clone()),
            MailboxPolicy::Pop => {
                self.pending = false;
                Some(std::mem::take(&mut self.text))
            }
        }
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
