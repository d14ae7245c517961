// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Devrelay: relay between a browser control surface and a single device.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod firmware;
pub mod mailbox;
pub mod registry;
pub mod relay;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::RelayConfig;
use crate::state::RelayState;
use crate::transport::build_router;

/// Run the relay server until shutdown.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let shutdown = CancellationToken::new();

    info!(
        mailbox_policy = config.mailbox_policy.as_str(),
        evict = ?config.evict,
        firmware_dir = %config.firmware_dir().display(),
        "devrelay listening on {addr}"
    );

    let state = Arc::new(RelayState::new(config, shutdown.clone()));
    spawn_signal_handler(shutdown.clone());

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    info!("devrelay stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGTERM");
                shutdown.cancel();
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGINT");
                shutdown.cancel();
            }
        }
    });
}
