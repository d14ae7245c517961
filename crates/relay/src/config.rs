// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

use crate::mailbox::MailboxPolicy;
use crate::registry::EvictPolicy;

/// Default first-message token that promotes a connection to the device role.
pub const DEFAULT_REGISTRATION_TOKEN: &str = "ESP32_READY";

/// Configuration for the devrelay server.
#[derive(Debug, Clone, Parser)]
#[command(name = "devrelay", version, about = "Relay between a web control surface and one device")]
pub struct RelayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "DEVRELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// First WebSocket message that registers a connection as the device.
    #[arg(long, default_value = DEFAULT_REGISTRATION_TOKEN, env = "DEVRELAY_REGISTRATION_TOKEN")]
    pub registration_token: String,

    /// Read policy for the polling mailbox.
    #[arg(long, value_enum, default_value_t = MailboxPolicy::Pop, env = "DEVRELAY_MAILBOX_POLICY")]
    pub mailbox_policy: MailboxPolicy,

    /// What happens to the previous device connection when a new one registers.
    #[arg(long, value_enum, default_value_t = EvictPolicy::Orphan, env = "DEVRELAY_EVICT")]
    pub evict: EvictPolicy,

    /// Directory holding the uploaded firmware image.
    #[arg(long, env = "DEVRELAY_FIRMWARE_DIR")]
    pub firmware_dir: Option<PathBuf>,

    /// Maximum accepted firmware upload size in bytes.
    #[arg(long, default_value_t = 4 * 1024 * 1024, env = "DEVRELAY_MAX_FIRMWARE_BYTES")]
    pub max_firmware_bytes: usize,

    /// Serve the web control surface from this directory.
    #[arg(long, env = "DEVRELAY_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Log format (json or text).
    #[arg(long, env = "DEVRELAY_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "DEVRELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl RelayConfig {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registration_token.trim().is_empty() {
            anyhow::bail!("--registration-token must not be empty");
        }
        if self.registration_token.trim() != self.registration_token {
            anyhow::bail!("--registration-token must not have surrounding whitespace");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid --log-format: {other} (expected json or text)"),
        }
        if self.max_firmware_bytes == 0 {
            anyhow::bail!("--max-firmware-bytes must be greater than zero");
        }
        if let Some(ref dir) = self.static_dir {
            if !dir.is_dir() {
                anyhow::bail!("--static-dir {} is not a directory", dir.display());
            }
        }
        Ok(())
    }

    /// Directory the firmware image is written to.
    pub fn firmware_dir(&self) -> PathBuf {
        self.firmware_dir.clone().unwrap_or_else(|| std::env::temp_dir().join("devrelay-firmware"))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
