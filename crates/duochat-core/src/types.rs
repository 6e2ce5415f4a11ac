//! The persisted message record and its timestamp handling.
//!
//! Records on disk look like:
//!
//! ```json
//! {"sender": "alice", "text": "hi", "timestamp": "2026-10-18 09:15 PM", "ts": 1792339500, "read": false}
//! ```
//!
//! Older files may lack `ts` (and sometimes `read`), and their `timestamp`
//! strings come in several historical formats. [`ChatMessage::effective_time`]
//! resolves all of them to a single instant.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Display format for new messages (`2026-10-18 09:15 PM`).
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Historical display formats, tried in this order.
const LEGACY_FORMATS: &[&str] = &[DISPLAY_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Zone-less ISO-8601 shapes accepted by the generic fallback.
const NAIVE_ISO_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

// ─────────────────────────────────────────────
// ChatMessage
// ─────────────────────────────────────────────

/// One chat message as stored in a pair's JSON file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    /// Display-formatted send time.
    #[serde(default)]
    pub timestamp: String,
    /// Unix epoch seconds. Missing on legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
    #[serde(default)]
    pub read: bool,
}

impl ChatMessage {
    /// Create an unread message stamped with `now`, displayed in `tz`.
    pub fn new(
        sender: impl Into<String>,
        text: impl Into<String>,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> Self {
        ChatMessage {
            sender: sender.into(),
            text: text.into(),
            timestamp: display_timestamp(now, tz),
            ts: Some(now.timestamp()),
            read: false,
        }
    }

    /// The instant this message was sent.
    ///
    /// Prefers the epoch field, then the display string, then `now`.
    pub fn effective_time(&self, tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
        if let Some(ts) = self.ts {
            if let Some(dt) = DateTime::from_timestamp(ts, 0) {
                return dt;
            }
        }
        parse_timestamp(&self.timestamp, tz).unwrap_or(now)
    }

    /// Whether `viewer` authored this message.
    pub fn is_from(&self, viewer: &str) -> bool {
        self.sender == viewer
    }
}

// ─────────────────────────────────────────────
// Timestamp helpers
// ─────────────────────────────────────────────

/// Format `now` in `tz` using [`DISPLAY_FORMAT`].
pub fn display_timestamp(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format(DISPLAY_FORMAT).to_string()
}

/// Parse a stored display timestamp.
///
/// Zone-less values are interpreted in `tz`. Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in LEGACY_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return localize(naive, tz);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_ISO_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return localize(naive, tz);
        }
    }
    None
}

/// Attach `tz` to a wall-clock time. Ambiguous times take the earlier instant.
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Flip every unread message not authored by `reader` to read.
///
/// Returns how many messages changed.
pub fn mark_read_pass(messages: &mut [ChatMessage], reader: &str) -> usize {
    let mut changed = 0;
    for msg in messages.iter_mut() {
        if !msg.is_from(reader) && !msg.read {
            msg.read = true;
            changed += 1;
        }
    }
    changed
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
