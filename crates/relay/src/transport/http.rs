// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the relay.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::RelayError;
use crate::mailbox::MailboxPolicy;
use crate::state::RelayState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub device_connected: bool,
    pub mailbox_policy: MailboxPolicy,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub text: String,
    /// Whether a device connection took the payload. Informational only.
    pub delivered: bool,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub bytes: usize,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<RelayState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        device_connected: s.device_connected(),
        mailbox_policy: s.mailbox_policy(),
    })
}

/// `POST /send-text` — accept `{ "text": ... }`, fill the mailbox and push to the device.
///
/// Succeeds whether or not a device is connected.
pub async fn send_text(
    State(s): State<Arc<RelayState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!(err = %e, "rejected submission body");
        RelayError::MissingField.to_http_response("No text provided")
    })?;

    let text = match body.get("text").and_then(|v| v.as_str()) {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => return Err(RelayError::MissingField.to_http_response("No text provided")),
    };

    let outcome = s.submit(&text);
    if !outcome.is_delivered() {
        tracing::debug!(code = %RelayError::NoDeviceConnected, "submission accepted without delivery");
    }

    Ok(Json(SubmitResponse { status: "sent", text, delivered: outcome.is_delivered() }))
}

/// `GET /get-text` — poll the mailbox. Empty text means nothing pending.
pub async fn get_text(State(s): State<Arc<RelayState>>) -> impl IntoResponse {
    Json(FetchResponse { text: s.consume().unwrap_or_default() })
}

/// `POST /upload` — store the single file field as the current firmware image.
pub async fn upload_firmware(
    State(s): State<Arc<RelayState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let mut multipart = multipart.map_err(|e| {
        (e.status(), Json(RelayError::BadRequest.to_error_body(e.body_text()))).into_response()
    })?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return Err(RelayError::BadRequest
                    .to_http_response("No file field in upload")
                    .into_response());
            }
            Err(e) => {
                return Err((
                    e.status(),
                    Json(RelayError::BadRequest.to_error_body(e.body_text())),
                )
                    .into_response());
            }
        };
        if field.file_name().is_none() {
            continue;
        }

        let blob = field.bytes().await.map_err(|e| {
            (e.status(), Json(RelayError::BadRequest.to_error_body(e.body_text()))).into_response()
        })?;

        let handle = s.firmware.upload(&blob).await.map_err(|e| {
            e.to_http_response("Failed to store firmware").into_response()
        })?;

        return Ok(Json(UploadResponse { status: "uploaded", bytes: handle.bytes }));
    }
}

/// `GET /firmware.bin` — serve the last uploaded image.
pub async fn fetch_firmware(
    State(s): State<Arc<RelayState>>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    match s.firmware.fetch_current().await {
        Ok(blob) => Ok(([(header::CONTENT_TYPE, "application/octet-stream")], blob)),
        Err(RelayError::NoFirmwareAvailable) => {
            Err(RelayError::NoFirmwareAvailable.to_http_response("No firmware uploaded"))
        }
        Err(e) => Err(e.to_http_response("Failed to read firmware")),
    }
}
