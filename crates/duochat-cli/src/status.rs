//! `duochat status` — show configuration and store status.

use anyhow::Result;
use colored::Colorize;

use duochat_core::config::{get_config_path, load_config};
use duochat_core::MessageStore;

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "💬 Duochat Status".magenta().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        found_marker(config_path.exists())
    );

    let data_dir = config.store.data_path();
    println!(
        "  {:<18} {} {}",
        "Chat data:".bold(),
        data_dir.display(),
        found_marker(data_dir.exists())
    );

    if data_dir.exists() {
        let store = MessageStore::new(Some(data_dir), config.display.tz())?;
        let stores = store.list_stores();
        let bytes: u64 = stores.iter().map(|s| s.size).sum();
        println!(
            "  {:<18} {} {}",
            "Conversations:".bold(),
            stores.len(),
            format!("({bytes} bytes)").dimmed()
        );
    }

    println!(
        "  {:<18} {}h | timezone: {}",
        "Retention:".bold(),
        config.store.retention_hours,
        config.display.tz()
    );

    let users: Vec<&str> = config.users.keys().map(String::as_str).collect();
    let users_line = if users.is_empty() {
        "none configured".red().to_string()
    } else {
        users.join(", ")
    };
    println!("  {:<18} {}", "Users:".bold(), users_line);

    let ai_status = if config.ai.is_configured() {
        format!("{} (key set, model {})", "✓".green(), config.ai.model)
    } else {
        format!("{}", "· not configured".dimmed())
    };
    println!("  {:<18} {}", "AI replies:".bold(), ai_status);

    println!(
        "  {:<18} http://{}:{}",
        "Web UI:".bold(),
        config.server.host,
        config.server.port
    );
    println!();

    Ok(())
}

fn found_marker(exists: bool) -> String {
    if exists {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}
