//! Shared CLI helpers — banners and terminal bubbles.

use colored::Colorize;

use duochat_core::render::Ticks;
use duochat_core::utils::capitalize;
use duochat_core::{ChatMessage, ChatView};

/// Width of the terminal chat column.
const CHAT_WIDTH: usize = 72;

/// Print the banner shown at REPL start.
pub fn print_banner(app_name: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}",
        format!("💬 {app_name}").magenta().bold(),
        version.dimmed()
    );
    println!(
        "{}",
        "Type a message, /ai <prompt>, /refresh, /delete, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Lay out one message for the terminal: own messages right, others left.
pub fn terminal_bubble(message: &ChatMessage, viewer: &str) -> String {
    let own = message.is_from(viewer);
    let ticks = Ticks::for_message(message, viewer).symbol();

    let header = capitalize(&message.sender);
    let footer = format!("🕒 {} {}", message.timestamp, ticks);
    let footer = footer.trim_end();

    let lines = [header.as_str(), message.text.as_str(), footer];
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let styled = match (i, own) {
            (0, true) => line.magenta().bold().to_string(),
            (0, false) => line.yellow().bold().to_string(),
            (2, _) if ticks == "✔✔" => line.blue().to_string(),
            (2, _) => line.dimmed().to_string(),
            _ => line.to_string(),
        };
        if own {
            let pad = CHAT_WIDTH.saturating_sub(line.chars().count());
            out.push_str(&" ".repeat(pad));
        }
        out.push_str(&styled);
        out.push('\n');
    }
    out
}

/// Print a full conversation view.
pub fn print_view(view: &ChatView) {
    println!();
    println!(
        "{}",
        format!("── {} ↔ {} ──", view.user, view.partner).dimmed()
    );
    if let Some(warning) = &view.warning {
        println!("{} {}", "⚠️".yellow(), warning);
    }
    if view.messages.is_empty() {
        println!("{}", "(no messages in the last two days)".dimmed());
    }
    for message in &view.messages {
        print!("{}", terminal_bubble(message, &view.user));
    }
    println!();
}

/// Print a "thinking" placeholder while waiting on the AI.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
