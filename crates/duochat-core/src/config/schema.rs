//! Configuration schema.
//!
//! Hierarchy: `Config` → `users`, `StoreConfig`, `DisplayConfig`, `AiConfig`,
//! `ServerConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::Credentials;
use crate::store::DEFAULT_RETENTION_HOURS;
use crate::utils;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.duochat/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Static credential table: identity → secret.
    pub users: BTreeMap<String, String>,
    pub store: StoreConfig,
    pub display: DisplayConfig,
    pub ai: AiConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Build the login gate from the `users` table.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.users.clone())
    }
}

// ─────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────

/// Where pair files live and how long messages are kept.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Directory for the per-pair `.json` files (`~` is expanded).
    pub data_dir: String,
    /// Messages older than this many hours are pruned on load.
    pub retention_hours: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.duochat/chat_data".to_string(),
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}

impl StoreConfig {
    pub fn data_path(&self) -> PathBuf {
        utils::expand_home(&self.data_dir)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.retention_hours))
    }
}

// ─────────────────────────────────────────────
// Display
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayConfig {
    /// Application title shown in pages and banners.
    pub app_name: String,
    /// IANA zone for display timestamps and zone-less legacy timestamps.
    pub timezone: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            app_name: "MyChatPro".to_string(),
            timezone: "Asia/Karachi".to_string(),
        }
    }
}

impl DisplayConfig {
    /// The configured zone, falling back to UTC when the name is unknown.
    pub fn tz(&self) -> Tz {
        match self.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(e) => {
                warn!(timezone = %self.timezone, error = %e, "unknown timezone, using UTC");
                Tz::UTC
            }
        }
    }
}

// ─────────────────────────────────────────────
// AI
// ─────────────────────────────────────────────

/// Hosted-model settings for `/ai` replies (OpenAI-compatible API).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    /// API key for Bearer authentication. Empty disables `/ai`.
    pub api_key: String,
    /// Custom API base URL (defaults to Groq).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Sender name recorded on AI replies.
    pub assistant_name: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: "llama3-8b-8192".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            assistant_name: crate::session::DEFAULT_ASSISTANT_NAME.to_string(),
        }
    }
}

impl AiConfig {
    /// Whether an API key is set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// Web UI listener and session lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sessions older than this are discarded.
    pub session_ttl_minutes: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            session_ttl_minutes: 720,
        }
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.session_ttl_minutes))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
