//! Config loader — reads `~/.duochat/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.duochat/config.json`
//! 3. Environment variables `DUOCHAT_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    // Parse JSON → Value first for migration
    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Moves a top-level `GROQ_API_KEY` secret → `ai.apiKey`.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };
    let Some(key) = root.remove("GROQ_API_KEY") else {
        return;
    };

    let ai = root
        .entry("ai")
        .or_insert_with(|| serde_json::Value::Object(Default::default()));
    if let Some(ai) = ai.as_object_mut() {
        if !ai.contains_key("apiKey") {
            ai.insert("apiKey".to_string(), key);
            debug!("Migrated GROQ_API_KEY → ai.apiKey");
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `DUOCHAT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `DUOCHAT_STORE__DATA_DIR` → `store.data_dir`
/// - `DUOCHAT_STORE__RETENTION_HOURS` → `store.retention_hours`
/// - `DUOCHAT_DISPLAY__TIMEZONE` → `display.timezone`
/// - `DUOCHAT_AI__API_KEY` → `ai.api_key`
/// - `DUOCHAT_AI__API_BASE` → `ai.api_base`
/// - `DUOCHAT_AI__MODEL` → `ai.model`
/// - `DUOCHAT_SERVER__HOST` → `server.host`
/// - `DUOCHAT_SERVER__PORT` → `server.port`
fn apply_env_overrides(mut config: Config) -> Config {
    // Store
    if let Ok(val) = std::env::var("DUOCHAT_STORE__DATA_DIR") {
        config.store.data_dir = val;
    }
    if let Ok(val) = std::env::var("DUOCHAT_STORE__RETENTION_HOURS") {
        if let Ok(n) = val.parse::<u32>() {
            config.store.retention_hours = n;
        }
    }

    // Display
    if let Ok(val) = std::env::var("DUOCHAT_DISPLAY__TIMEZONE") {
        config.display.timezone = val;
    }

    // AI
    if let Ok(val) = std::env::var("DUOCHAT_AI__API_KEY") {
        config.ai.api_key = val;
    }
    if let Ok(val) = std::env::var("DUOCHAT_AI__API_BASE") {
        config.ai.api_base = Some(val);
    }
    if let Ok(val) = std::env::var("DUOCHAT_AI__MODEL") {
        config.ai.model = val;
    }

    // Server
    if let Ok(val) = std::env::var("DUOCHAT_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("DUOCHAT_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
