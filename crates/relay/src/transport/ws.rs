// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket handler shared by the device and controllers.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Request, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tower::ServiceExt;

use crate::endpoint::Connection;
use crate::state::RelayState;

/// `GET /ws` — WebSocket upgrade. Role is decided by the first message.
pub async fn ws_handler(
    State(state): State<Arc<RelayState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// `GET /` — WebSocket upgrade when requested, otherwise the control surface.
pub async fn root_handler(
    State(state): State<Arc<RelayState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    req: Request,
) -> Response {
    if let Ok(ws) = ws {
        return ws.on_upgrade(move |socket| handle_ws(socket, state)).into_response();
    }
    let Some(ref dir) = state.config.static_dir else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match super::control_surface(dir).oneshot(req).await {
        Ok(resp) => resp.into_response(),
        Err(never) => match never {},
    }
}

/// Per-connection WebSocket handler.
async fn handle_ws(socket: WebSocket, state: Arc<RelayState>) {
    let (handle, mut outbound) = state.open_endpoint();
    let evicted = handle.closed_token();
    let mut conn = Connection::new(handle);
    tracing::info!(endpoint = conn.id(), "websocket client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            _ = evicted.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            // Relayed payloads for this connection.
            frame = outbound.recv() => {
                let Some(text) = frame else { break };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        conn.on_text(&state, text.as_str());
                    }
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => {
                            conn.on_text(&state, text);
                        }
                        Err(_) => {
                            tracing::debug!(endpoint = conn.id(), "ignoring non-UTF-8 binary frame");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(endpoint = conn.id(), err = %e, "websocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // Stop accepting frames before the registry entry goes away.
    outbound.close();
    state.on_close(conn.id());
    tracing::info!(endpoint = conn.id(), role = %conn.role(), "websocket client disconnected");
}
