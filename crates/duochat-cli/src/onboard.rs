//! `duochat onboard` — initialize configuration and data directory.
//!
//! - Creates `~/.duochat/config.json` with defaults and two placeholder users
//! - Creates the chat data and history directories

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use duochat_core::config::{get_config_path, load_config, save_config, Config};
use duochat_core::utils::get_data_path;

/// Placeholder identities written into a fresh config.
const SAMPLE_USERS: &[(&str, &str)] = &[("alice", "change-me"), ("bob", "change-me")];

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "💬 Duochat — Setup".magenta().bold());
    println!();

    let config_path = get_config_path();
    let config = ensure_config(&config_path)?;

    let chat_dir = config.store.data_path();
    std::fs::create_dir_all(&chat_dir)
        .with_context(|| format!("failed to create {}", chat_dir.display()))?;
    println!("  {} chat data at {}", "✓".green(), chat_dir.display());

    let history_dir = get_data_path().join("history");
    std::fs::create_dir_all(&history_dir)?;

    println!();
    println!(
        "{}",
        "  Setup complete! Edit the users in config.json, then run `duochat serve`.".green()
    );
    println!();

    Ok(())
}

/// Load the config at `path`, writing a seeded default first if it is missing.
fn ensure_config(path: &Path) -> Result<Config> {
    if path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            path.display()
        );
        return Ok(load_config(Some(path)));
    }

    let config = seeded_config();
    save_config(&config, Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("  {} created config at {}", "✓".green(), path.display());
    Ok(config)
}

fn seeded_config() -> Config {
    let mut config = Config::default();
    for (user, secret) in SAMPLE_USERS {
        config.users.insert(user.to_string(), secret.to_string());
    }
    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_config_pairs_two_users() {
        let config = seeded_config();
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.credentials().partner_of("alice"), Some("bob"));
    }

    #[test]
    fn test_ensure_config_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let first = ensure_config(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first.users.len(), 2);

        let mut edited = first.clone();
        edited.users.insert("carol".to_string(), "pw".to_string());
        save_config(&edited, Some(&path)).unwrap();

        let second = ensure_config(&path).unwrap();
        assert!(second.users.contains_key("carol"));
    }
}
