//! Terminal session loop — login, then refresh / send / delete in a readline.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use duochat_core::config::Config;
use duochat_core::session::parse_ai_command;
use duochat_core::utils::capitalize_first;
use duochat_core::{ChatSession, MessageStore};
use duochat_providers::{ask_ai, ReplyProvider};

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Wrong-secret attempts before giving up.
const MAX_LOGIN_ATTEMPTS: usize = 3;

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Refresh,
    Delete,
    Ai(&'a str),
    Send(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    if EXIT_COMMANDS.contains(&trimmed.to_lowercase().as_str()) {
        return Input::Exit;
    }
    match trimmed {
        "/refresh" => Input::Refresh,
        "/delete" => Input::Delete,
        _ => match parse_ai_command(trimmed) {
            Some(prompt) => Input::Ai(prompt),
            None => Input::Send(trimmed),
        },
    }
}

/// Run the interactive chat loop for `user`.
pub async fn run(
    config: &Config,
    store: MessageStore,
    provider: Option<Arc<dyn ReplyProvider>>,
    user: &str,
) -> Result<()> {
    helpers::print_banner(&config.display.app_name);

    let mut editor = create_editor()?;
    let session = login(&mut editor, config, user)?;
    println!(
        "{} Logged in as {}, chatting with {}",
        "✅".green(),
        session.user.bold(),
        session.partner.bold()
    );

    refresh(&session, &store);

    loop {
        let line = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let input = parse_input(&line);
        if input != Input::Empty {
            let _ = editor.add_history_entry(line.trim());
        }

        match input {
            Input::Empty => continue,
            Input::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            Input::Refresh => {}
            Input::Delete => match session.delete(&store) {
                Ok(outcome) => println!("{}", outcome.notice().yellow()),
                Err(e) => eprintln!("\n❌ Error: {e}\n"),
            },
            Input::Ai(prompt) => match &provider {
                Some(provider) => {
                    helpers::print_thinking();
                    let result = ask_ai(
                        &session,
                        &store,
                        provider.as_ref(),
                        prompt,
                        &config.ai.assistant_name,
                    )
                    .await;
                    helpers::clear_thinking();
                    if let Err(e) = result {
                        eprintln!("\n❌ Error: {e}\n");
                    }
                }
                None => println!("{}", "AI replies are not configured.".yellow()),
            },
            Input::Send(text) => {
                debug!(user = %session.user, "sending message");
                if let Err(e) = session.send(&store, text) {
                    eprintln!("\n❌ Error: {e}\n");
                }
            }
        }

        refresh(&session, &store);
    }

    save_history(&mut editor);
    Ok(())
}

/// Ask for the secret until it matches or attempts run out.
fn login(
    editor: &mut Editor<(), DefaultHistory>,
    config: &Config,
    user: &str,
) -> Result<ChatSession> {
    let credentials = config.credentials();
    if credentials.is_empty() {
        bail!("no users configured; run `duochat onboard` and edit config.json");
    }

    for _ in 0..MAX_LOGIN_ATTEMPTS {
        let secret = editor.readline("Password: ")?;
        match credentials.verify(user, secret.trim()) {
            Ok(session) => return Ok(session),
            Err(e) => eprintln!("{} {}", "❌".red(), capitalize_first(&e.to_string())),
        }
    }
    bail!("too many failed login attempts")
}

/// Run one view cycle and print it.
fn refresh(session: &ChatSession, store: &MessageStore) {
    match session.refresh(store) {
        Ok(view) => helpers::print_view(&view),
        Err(e) => eprintln!("\n❌ Error: {e}\n"),
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    duochat_core::utils::get_data_path()
        .join("history")
        .join("chat_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("EXIT"), Input::Exit);
        assert_eq!(parse_input("/quit"), Input::Exit);
        assert_eq!(parse_input(":q"), Input::Exit);
    }

    #[test]
    fn chat_commands() {
        assert_eq!(parse_input("  /refresh "), Input::Refresh);
        assert_eq!(parse_input("/delete"), Input::Delete);
        assert_eq!(parse_input("/ai write a haiku"), Input::Ai("write a haiku"));
        assert_eq!(parse_input("hello"), Input::Send("hello"));
        assert_eq!(parse_input("   "), Input::Empty);
    }

    #[test]
    fn bare_ai_prefix_is_a_message() {
        assert_eq!(parse_input("/ai"), Input::Send("/ai"));
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".duochat"));
        assert!(path.to_string_lossy().contains("chat_history"));
    }
}
