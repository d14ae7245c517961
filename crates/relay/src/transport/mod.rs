// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the relay.

pub mod http;
pub mod ws;

use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::state::RelayState;

/// Build the axum `Router` with all relay routes.
pub fn build_router(state: Arc<RelayState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_firmware_bytes);

    let router = Router::new()
        // Health
        .route("/api/v1/health", get(http::health))
        // Push path: device and controllers share one socket endpoint,
        // reachable at the root as well for clients built against it.
        .route("/", get(ws::root_handler))
        .route("/ws", get(ws::ws_handler))
        // Submission and polling mailbox
        .route("/send-text", post(http::send_text))
        .route("/get-text", get(http::get_text))
        // Firmware
        .route("/upload", post(http::upload_firmware).layer(upload_limit))
        .route("/firmware.bin", get(http::fetch_firmware));

    let router = match state.config.static_dir {
        Some(ref dir) => router.fallback_service(control_surface(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

/// Static control surface, with index.html for client-side routes.
pub(crate) fn control_surface(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}
