//! Duochat core — a two-person chat backed by one JSON file per pair.
//!
//! # Modules
//!
//! - [`types`] — the persisted [`types::ChatMessage`] record and timestamp handling
//! - [`store`] — [`store::MessageStore`]: resolve / load+prune / save / append / mark-read / delete
//! - [`session`] — credentials, the per-login [`session::ChatSession`] and its interaction cycle
//! - [`render`] — HTML bubbles and page templates
//! - [`config`] — `~/.duochat/config.json` + env var overrides
//! - [`utils`] — path helpers

pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

pub use error::{LoginError, StoreError};
pub use session::{ChatSession, ChatView, Credentials, DeleteOutcome};
pub use store::{LoadWarning, Loaded, MessageStore, StoreId};
pub use types::ChatMessage;
