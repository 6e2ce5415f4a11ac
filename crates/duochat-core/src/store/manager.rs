//! Pair-keyed JSON persistence with retention pruning.
//!
//! Every operation is a full read, filter and rewrite of one small file.
//! There is no locking: two writers racing on the same pair resolve as
//! last-write-wins.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::types::{mark_read_pass, ChatMessage};
use crate::utils;

/// Messages older than this are dropped on load.
pub const DEFAULT_RETENTION_HOURS: u32 = 48;

// ─────────────────────────────────────────────
// StoreId
// ─────────────────────────────────────────────

/// Deterministic key for an unordered pair of participants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreId(String);

impl StoreId {
    /// Sort the two identities and join them with `_`.
    ///
    /// `resolve(a, b) == resolve(b, a)` for every pair.
    pub fn resolve(user_a: &str, user_b: &str) -> Self {
        let (first, second) = if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        StoreId(format!("{first}_{second}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────
// Load results
// ─────────────────────────────────────────────

/// Recoverable problem encountered while loading a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadWarning {
    /// The file exists but is not a JSON array of messages.
    Corrupted { path: PathBuf, detail: String },
    /// The file exists but could not be read.
    Unreadable { path: PathBuf, detail: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::Corrupted { .. } => {
                f.write_str("Chat file is corrupted or unreadable. Starting fresh.")
            }
            LoadWarning::Unreadable { detail, .. } => {
                write!(f, "Chat file could not be read ({detail}). Try again later.")
            }
        }
    }
}

/// Messages retained after a load, plus any warning to surface to the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Loaded {
    pub messages: Vec<ChatMessage>,
    pub warning: Option<LoadWarning>,
}

impl Loaded {
    fn empty_with(warning: LoadWarning) -> Self {
        Loaded {
            messages: Vec::new(),
            warning: Some(warning),
        }
    }

    /// The read failure behind an empty load, if any. Saving over it would
    /// discard a file that may still be intact.
    fn unreadable(&self) -> Option<(&PathBuf, &str)> {
        match &self.warning {
            Some(LoadWarning::Unreadable { path, detail }) => Some((path, detail.as_str())),
            _ => None,
        }
    }
}

/// Summary of one store file for listing purposes.
#[derive(Clone, Debug)]
pub struct StoreSummary {
    pub id: String,
    pub path: PathBuf,
    pub size: u64,
}

// ─────────────────────────────────────────────
// MessageStore
// ─────────────────────────────────────────────

/// File-backed message store: one JSON array per participant pair.
#[derive(Clone, Debug)]
pub struct MessageStore {
    /// Directory holding the `.json` pair files.
    data_dir: PathBuf,
    /// Age beyond which messages are pruned.
    retention: Duration,
    /// Zone used to interpret zone-less legacy timestamps.
    tz: Tz,
}

impl MessageStore {
    /// Create a store rooted at `data_dir` (default `~/.duochat/chat_data/`).
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(data_dir: Option<PathBuf>, tz: Tz) -> Result<Self, StoreError> {
        let dir = data_dir.unwrap_or_else(utils::get_chat_data_path);
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        Ok(MessageStore {
            data_dir: dir,
            retention: Duration::hours(i64::from(DEFAULT_RETENTION_HOURS)),
            tz,
        })
    }

    /// Override the retention window.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Path of the backing file for `id`.
    pub fn store_path(&self, id: &StoreId) -> PathBuf {
        self.data_dir
            .join(format!("{}.json", utils::safe_filename(id.as_str())))
    }

    /// Load and prune the messages for `id`.
    ///
    /// A missing file is an empty store. A corrupted file is an empty store
    /// plus a warning; it stays on disk until the next save overwrites it.
    pub fn load(&self, id: &StoreId) -> Loaded {
        self.load_at(id, Utc::now())
    }

    /// [`load`](Self::load) against an explicit clock.
    pub fn load_at(&self, id: &StoreId, now: DateTime<Utc>) -> Loaded {
        let path = self.store_path(id);

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(store = %id, "no store file yet");
                return Loaded::default();
            }
            Err(e) => {
                warn!(store = %id, path = %path.display(), error = %e, "failed to read store file");
                return Loaded::empty_with(LoadWarning::Unreadable {
                    path,
                    detail: e.to_string(),
                });
            }
        };

        let messages: Vec<ChatMessage> = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                warn!(store = %id, path = %path.display(), error = %e, "store file is corrupted");
                return Loaded::empty_with(LoadWarning::Corrupted {
                    path,
                    detail: e.to_string(),
                });
            }
        };

        let total = messages.len();
        let retained = self.prune(messages, now);

        if retained.len() != total {
            info!(
                store = %id,
                dropped = total - retained.len(),
                kept = retained.len(),
                "pruned expired messages"
            );
            if let Err(e) = self.save(id, &retained) {
                warn!(store = %id, error = %e, "failed to persist pruned store");
            }
        }

        debug!(store = %id, messages = retained.len(), "loaded store");
        Loaded {
            messages: retained,
            warning: None,
        }
    }

    /// Keep messages whose effective time is within the retention window.
    ///
    /// A window reaching past the earliest representable date keeps everything.
    fn prune(&self, messages: Vec<ChatMessage>, now: DateTime<Utc>) -> Vec<ChatMessage> {
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return messages;
        };
        messages
            .into_iter()
            .filter(|m| m.effective_time(self.tz, now) >= cutoff)
            .collect()
    }

    /// Overwrite the file for `id` with `messages` (pretty-printed).
    pub fn save(&self, id: &StoreId, messages: &[ChatMessage]) -> Result<(), StoreError> {
        let path = self.store_path(id);

        let json = serde_json::to_string_pretty(messages).map_err(|source| {
            StoreError::Serialize {
                path: path.clone(),
                source,
            }
        })?;

        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };
        let file = std::fs::File::create(&path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json.as_bytes()).map_err(write_err)?;
        writer.flush().map_err(write_err)?;

        debug!(store = %id, messages = messages.len(), path = %path.display(), "saved store");
        Ok(())
    }

    /// Load, push `message` as unread, save.
    pub fn append(&self, id: &StoreId, message: ChatMessage) -> Result<Loaded, StoreError> {
        self.append_at(id, message, Utc::now())
    }

    /// [`append`](Self::append) against an explicit clock.
    pub fn append_at(
        &self,
        id: &StoreId,
        mut message: ChatMessage,
        now: DateTime<Utc>,
    ) -> Result<Loaded, StoreError> {
        let mut loaded = self.load_at(id, now);
        if let Some((path, detail)) = loaded.unreadable() {
            return Err(StoreError::Unreadable {
                path: path.clone(),
                detail: detail.to_string(),
            });
        }
        message.read = false;
        loaded.messages.push(message);
        self.save(id, &loaded.messages)?;
        Ok(loaded)
    }

    /// Load, mark everything not sent by `reader` as read, save.
    ///
    /// Saves unconditionally unless the file could not be read. Returns the
    /// marked messages.
    pub fn mark_read(&self, id: &StoreId, reader: &str) -> Result<Loaded, StoreError> {
        self.mark_read_at(id, reader, Utc::now())
    }

    /// [`mark_read`](Self::mark_read) against an explicit clock.
    pub fn mark_read_at(
        &self,
        id: &StoreId,
        reader: &str,
        now: DateTime<Utc>,
    ) -> Result<Loaded, StoreError> {
        let mut loaded = self.load_at(id, now);
        if loaded.unreadable().is_some() {
            return Ok(loaded);
        }
        let changed = mark_read_pass(&mut loaded.messages, reader);
        if changed > 0 {
            debug!(store = %id, reader, changed, "marked messages read");
        }
        self.save(id, &loaded.messages)?;
        Ok(loaded)
    }

    /// Remove the file for `id`. Returns whether a file existed.
    pub fn delete(&self, id: &StoreId) -> Result<bool, StoreError> {
        let path = self.store_path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(store = %id, "deleted store file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Remove { path, source }),
        }
    }

    /// List every store file in the data directory.
    pub fn list_stores(&self) -> Vec<StoreSummary> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read chat data directory: {}", e);
                return Vec::new();
            }
        };

        let mut summaries: Vec<StoreSummary> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().map_or(true, |ext| ext != "json") {
                    return None;
                }
                let id = path.file_stem()?.to_str()?.to_string();
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                Some(StoreSummary { id, path, size })
            })
            .collect();

        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
