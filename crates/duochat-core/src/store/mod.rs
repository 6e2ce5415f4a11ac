//! Message store — one pretty-printed JSON array per participant pair.
//!
//! # Disk format
//!
//! Each pair is a `.json` file under `~/.duochat/chat_data/`, named after the
//! two identities sorted and joined with `_` (e.g. `alice_bob.json`):
//!
//! ```json
//! [
//!   {"sender": "alice", "text": "hi", "timestamp": "2026-10-18 09:15 PM", "ts": 1792339500, "read": true}
//! ]
//! ```
//!
//! Every load prunes messages older than the retention window and rewrites
//! the file when anything was dropped.

pub mod manager;

pub use manager::{LoadWarning, Loaded, MessageStore, StoreId, StoreSummary, DEFAULT_RETENTION_HOURS};
