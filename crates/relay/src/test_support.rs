// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: state builder and in-process server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::mailbox::MailboxPolicy;
use crate::registry::EvictPolicy;
use crate::state::RelayState;

/// Builder for constructing `RelayState` in tests with sensible defaults.
pub struct StateBuilder {
    config: RelayConfig,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBuilder {
    pub fn new() -> Self {
        let mut config = RelayConfig::parse_from(["devrelay"]);
        config.host = "127.0.0.1".to_owned();
        config.port = 0;
        Self { config }
    }

    pub fn mailbox_policy(mut self, policy: MailboxPolicy) -> Self {
        self.config.mailbox_policy = policy;
        self
    }

    pub fn evict(mut self, evict: EvictPolicy) -> Self {
        self.config.evict = evict;
        self
    }

    pub fn registration_token(mut self, token: &str) -> Self {
        self.config.registration_token = token.to_owned();
        self
    }

    pub fn firmware_dir(mut self, dir: PathBuf) -> Self {
        self.config.firmware_dir = Some(dir);
        self
    }

    pub fn max_firmware_bytes(mut self, bytes: usize) -> Self {
        self.config.max_firmware_bytes = bytes;
        self
    }

    pub fn static_dir(mut self, dir: PathBuf) -> Self {
        self.config.static_dir = Some(dir);
        self
    }

    pub fn build(self) -> Arc<RelayState> {
        Arc::new(RelayState::new(self.config, CancellationToken::new()))
    }
}

/// Spawn an HTTP server on a random port for integration testing.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_http_server(
    state: Arc<RelayState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}
