//! `/ai` exchanges — ask the provider and record both sides in the chat.

use tracing::{info, warn};

use duochat_core::{ChatSession, MessageStore, StoreError};

use crate::traits::{is_error_reply, ReplyProvider};

/// Ask `provider` for a reply to `prompt` and append the exchange to the
/// session's conversation: the prompt as the user's own `/ai ` message, then
/// the reply (or labeled error) from `assistant_name`.
///
/// Returns the reply text.
pub async fn ask_ai(
    session: &ChatSession,
    store: &MessageStore,
    provider: &dyn ReplyProvider,
    prompt: &str,
    assistant_name: &str,
) -> Result<String, StoreError> {
    info!(user = %session.user, provider = provider.display_name(), "AI prompt");

    let reply = provider.reply(prompt).await;
    if is_error_reply(&reply) {
        warn!(user = %session.user, "AI reply failed: {}", reply);
    }

    session.record_ai_exchange(store, prompt, &reply, assistant_name)?;
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono_tz::Asia::Karachi;

    struct Echo;

    #[async_trait]
    impl ReplyProvider for Echo {
        async fn reply(&self, prompt: &str) -> String {
            format!("echo: {prompt}")
        }

        fn display_name(&self) -> &str {
            "echo"
        }
    }

    struct Broken;

    #[async_trait]
    impl ReplyProvider for Broken {
        async fn reply(&self, _prompt: &str) -> String {
            crate::traits::error_reply("connection refused")
        }

        fn display_name(&self) -> &str {
            "broken"
        }
    }

    fn setup() -> (tempfile::TempDir, MessageStore, ChatSession) {
        let dir = tempfile::tempdir().unwrap();
        let store = MessageStore::new(Some(dir.path().to_path_buf()), Karachi).unwrap();
        (dir, store, ChatSession::new("alice", "bob"))
    }

    #[tokio::test]
    async fn test_exchange_is_recorded_in_order() {
        let (_dir, store, session) = setup();

        let reply = ask_ai(&session, &store, &Echo, "hi", "assistant").await.unwrap();
        assert_eq!(reply, "echo: hi");

        let loaded = store.load(&session.store_id);
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[0].sender, "alice");
        assert_eq!(loaded.messages[0].text, "/ai hi");
        assert_eq!(loaded.messages[1].sender, "assistant");
        assert_eq!(loaded.messages[1].text, "echo: hi");
        assert!(loaded.messages.iter().all(|m| !m.read));
    }

    #[tokio::test]
    async fn test_error_reply_is_recorded_as_text() {
        let (_dir, store, session) = setup();

        let reply = ask_ai(&session, &store, &Broken, "hi", "assistant").await.unwrap();
        assert_eq!(reply, "[AI Error]: connection refused");

        let loaded = store.load(&session.store_id);
        assert_eq!(loaded.messages[1].text, "[AI Error]: connection refused");
    }
}
