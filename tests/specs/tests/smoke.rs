// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `devrelay` binary and exercise
//! HTTP submission, polling, firmware transfer, and the WebSocket relay.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use devrelay_specs::RelayProcess;

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn http_health() -> anyhow::Result<()> {
    let relay = RelayProcess::start()?;
    relay.wait_healthy(TIMEOUT).await?;

    let resp: serde_json::Value =
        reqwest::get(format!("{}/api/v1/health", relay.base_url())).await?.json().await?;

    assert_eq!(resp["status"], "running");
    assert_eq!(resp["device_connected"], false);
    assert_eq!(resp["mailbox_policy"], "pop");
    Ok(())
}

#[tokio::test]
async fn device_receives_submission() -> anyhow::Result<()> {
    let relay = RelayProcess::start()?;
    relay.wait_healthy(TIMEOUT).await?;

    let (ws, _) = tokio_tungstenite::connect_async(relay.ws_url()).await?;
    let (mut device_tx, mut device_rx) = ws.split();
    device_tx.send(Message::Text("ESP32_READY".into())).await?;
    relay.wait_device(true, TIMEOUT).await?;

    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .post(format!("{}/send-text", relay.base_url()))
        .json(&serde_json::json!({ "text": "hello" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp["status"], "sent");
    assert_eq!(resp["delivered"], true);

    let frame = tokio::time::timeout(TIMEOUT, device_rx.next())
        .await?
        .ok_or_else(|| anyhow::anyhow!("device socket closed"))??;
    assert_eq!(frame, Message::Text("hello".into()));

    device_tx.send(Message::Close(None)).await?;
    relay.wait_device(false, TIMEOUT).await?;
    Ok(())
}

#[tokio::test]
async fn missing_text_is_bad_request() -> anyhow::Result<()> {
    let relay = RelayProcess::start()?;
    relay.wait_healthy(TIMEOUT).await?;

    let resp = reqwest::Client::new()
        .post(format!("{}/send-text", relay.base_url()))
        .json(&serde_json::json!({}))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn peek_mailbox_over_http() -> anyhow::Result<()> {
    let relay = RelayProcess::build().mailbox_policy("peek").spawn()?;
    relay.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    client
        .post(format!("{}/send-text", relay.base_url()))
        .json(&serde_json::json!({ "text": "X" }))
        .send()
        .await?;

    for _ in 0..2 {
        let body: serde_json::Value =
            client.get(format!("{}/get-text", relay.base_url())).send().await?.json().await?;
        assert_eq!(body["text"], "X");
    }
    Ok(())
}

#[tokio::test]
async fn firmware_round_trip() -> anyhow::Result<()> {
    let relay = RelayProcess::start()?;
    relay.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let url = format!("{}/firmware.bin", relay.base_url());
    assert_eq!(client.get(&url).send().await?.status(), reqwest::StatusCode::NOT_FOUND);

    let part = reqwest::multipart::Part::bytes(b"\xe9firmware".to_vec()).file_name("fw.bin");
    let form = reqwest::multipart::Form::new().part("firmware", part);
    let resp = client.post(format!("{}/upload", relay.base_url())).multipart(form).send().await?;
    assert!(resp.status().is_success());

    let blob = client.get(&url).send().await?.bytes().await?;
    assert_eq!(blob.as_ref(), b"\xe9firmware");
    Ok(())
}

#[tokio::test]
async fn serves_static_control_surface() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("index.html"), "<html>speech control</html>")?;

    let relay = RelayProcess::build().static_dir(dir.path()).spawn()?;
    relay.wait_healthy(TIMEOUT).await?;

    let text = reqwest::get(format!("{}/", relay.base_url())).await?.text().await?;
    assert!(text.contains("speech control"));
    Ok(())
}

#[tokio::test]
async fn sigterm_shuts_down_cleanly() -> anyhow::Result<()> {
    let mut relay = RelayProcess::start()?;
    relay.wait_healthy(TIMEOUT).await?;

    let status = relay.terminate(TIMEOUT).await?;
    assert!(status.success(), "exit status: {status:?}");
    Ok(())
}
