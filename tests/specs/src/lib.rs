// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `devrelay` binary as a subprocess and exercises it over
//! HTTP and WebSocket.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times — only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to the compiled `devrelay` binary.
pub fn relay_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("devrelay")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// A running `devrelay` process that is killed on drop.
pub struct RelayProcess {
    child: Child,
    port: u16,
    _firmware_dir: tempfile::TempDir,
}

/// Builder for the relay's command-line options.
#[derive(Default)]
pub struct RelayBuilder {
    mailbox_policy: Option<String>,
    evict: Option<String>,
    static_dir: Option<PathBuf>,
}

impl RelayBuilder {
    /// Set `--mailbox-policy`.
    pub fn mailbox_policy(mut self, policy: &str) -> Self {
        self.mailbox_policy = Some(policy.to_owned());
        self
    }

    /// Set `--evict`.
    pub fn evict(mut self, policy: &str) -> Self {
        self.evict = Some(policy.to_owned());
        self
    }

    /// Set `--static-dir`.
    pub fn static_dir(mut self, dir: &Path) -> Self {
        self.static_dir = Some(dir.to_path_buf());
        self
    }

    pub fn spawn(self) -> anyhow::Result<RelayProcess> {
        ensure_crypto();
        let binary = relay_binary();
        anyhow::ensure!(binary.exists(), "devrelay binary not found at {}", binary.display());

        let port = free_port()?;
        let firmware_dir = tempfile::tempdir()?;

        let mut args: Vec<String> = vec![
            "--host".into(),
            "127.0.0.1".into(),
            "--port".into(),
            port.to_string(),
            "--firmware-dir".into(),
            firmware_dir.path().to_string_lossy().into_owned(),
            "--log-format".into(),
            "text".into(),
            "--log-level".into(),
            "warn".into(),
        ];
        if let Some(policy) = self.mailbox_policy {
            args.extend(["--mailbox-policy".into(), policy]);
        }
        if let Some(policy) = self.evict {
            args.extend(["--evict".into(), policy]);
        }
        if let Some(dir) = self.static_dir {
            args.extend(["--static-dir".into(), dir.to_string_lossy().into_owned()]);
        }

        let child = Command::new(&binary)
            .args(&args)
            .env_remove("PORT")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(RelayProcess { child, port, _firmware_dir: firmware_dir })
    }
}

impl RelayProcess {
    /// Create a builder for custom options.
    pub fn build() -> RelayBuilder {
        RelayBuilder::default()
    }

    /// Spawn devrelay with default options.
    pub fn start() -> anyhow::Result<Self> {
        Self::build().spawn()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL for HTTP requests.
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// WebSocket URL.
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    /// Poll health until responsive.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/api/v1/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("devrelay did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Poll health until `device_connected` equals `expected`.
    pub async fn wait_device(&self, expected: bool, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let url = format!("{}/api/v1/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("device_connected never became {expected} within {timeout:?}");
            }
            let body: serde_json::Value = reqwest::get(&url).await?.json().await?;
            if body["device_connected"] == expected {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Send SIGTERM and wait for the process to exit within `timeout`.
    pub async fn terminate(
        &mut self,
        timeout: Duration,
    ) -> anyhow::Result<std::process::ExitStatus> {
        let status = Command::new("kill").arg("-TERM").arg(self.child.id().to_string()).status()?;
        anyhow::ensure!(status.success(), "kill -TERM failed");

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("devrelay did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for RelayProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
