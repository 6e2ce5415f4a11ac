//! The per-login session context and its interaction cycle.
//!
//! One cycle: resolve the pair's store, load (pruning), mark the partner's
//! messages read, save, and hand the messages to a renderer. Sending and
//! deleting are single read-modify-write steps on the same store.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::StoreError;
use crate::store::{LoadWarning, MessageStore, StoreId};
use crate::types::ChatMessage;

/// Input lines starting with this are routed to the AI collaborator.
pub const AI_COMMAND_PREFIX: &str = "/ai ";

/// Sender name used for AI replies.
pub const DEFAULT_ASSISTANT_NAME: &str = "assistant";

/// A logged-in user chatting with their partner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatSession {
    pub user: String,
    pub partner: String,
    pub store_id: StoreId,
    pub created_at: DateTime<Utc>,
}

/// Everything a renderer needs after one cycle.
#[derive(Clone, Debug)]
pub struct ChatView {
    pub user: String,
    pub partner: String,
    pub messages: Vec<ChatMessage>,
    pub warning: Option<LoadWarning>,
}

/// Result of the delete-chat action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NothingToDelete,
}

impl DeleteOutcome {
    /// User-facing notice for this outcome.
    pub fn notice(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted => "Chat deleted!",
            DeleteOutcome::NothingToDelete => "No chat found to delete.",
        }
    }
}

impl ChatSession {
    pub fn new(user: impl Into<String>, partner: impl Into<String>) -> Self {
        let user = user.into();
        let partner = partner.into();
        let store_id = StoreId::resolve(&user, &partner);
        ChatSession {
            user,
            partner,
            store_id,
            created_at: Utc::now(),
        }
    }

    /// Whether this session has outlived `ttl`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > ttl
    }

    /// Run one view cycle: load, mark the partner's messages read, save.
    pub fn refresh(&self, store: &MessageStore) -> Result<ChatView, StoreError> {
        self.refresh_at(store, Utc::now())
    }

    pub fn refresh_at(
        &self,
        store: &MessageStore,
        now: DateTime<Utc>,
    ) -> Result<ChatView, StoreError> {
        let loaded = store.mark_read_at(&self.store_id, &self.user, now)?;
        debug!(
            user = %self.user,
            store = %self.store_id,
            messages = loaded.messages.len(),
            "refreshed chat view"
        );
        Ok(ChatView {
            user: self.user.clone(),
            partner: self.partner.clone(),
            messages: loaded.messages,
            warning: loaded.warning,
        })
    }

    /// Append `text` as a new message from the user.
    ///
    /// Blank input is ignored and returns `false`.
    pub fn send(&self, store: &MessageStore, text: &str) -> Result<bool, StoreError> {
        self.send_at(store, text, Utc::now())
    }

    pub fn send_at(
        &self,
        store: &MessageStore,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        let message = ChatMessage::new(&self.user, text, now, store.timezone());
        store.append_at(&self.store_id, message, now)?;
        Ok(true)
    }

    /// Record an AI exchange: the user's prompt, then the assistant's reply.
    pub fn record_ai_exchange(
        &self,
        store: &MessageStore,
        prompt: &str,
        reply: &str,
        assistant_name: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let tz = store.timezone();
        store.append_at(
            &self.store_id,
            ChatMessage::new(&self.user, format!("{AI_COMMAND_PREFIX}{prompt}"), now, tz),
            now,
        )?;
        store.append_at(
            &self.store_id,
            ChatMessage::new(assistant_name, reply, now, tz),
            now,
        )?;
        Ok(())
    }

    /// Remove the whole conversation.
    pub fn delete(&self, store: &MessageStore) -> Result<DeleteOutcome, StoreError> {
        if store.delete(&self.store_id)? {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NothingToDelete)
        }
    }
}

/// Split an input line into an AI prompt, if it is one.
pub fn parse_ai_command(input: &str) -> Option<&str> {
    input
        .strip_prefix(AI_COMMAND_PREFIX)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}
