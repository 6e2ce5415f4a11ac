//! Reply provider trait — the single seam to the hosted model.

use async_trait::async_trait;

/// Prefix on every failed reply.
pub const AI_ERROR_LABEL: &str = "[AI Error]";

/// Something that answers a prompt with text.
///
/// Implementations never fail: errors come back as
/// `"[AI Error]: <detail>"` in place of the reply. No retries, no streaming.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Answer a single-turn `prompt`.
    async fn reply(&self, prompt: &str) -> String;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

/// Format an error as a reply string.
pub fn error_reply(detail: impl std::fmt::Display) -> String {
    format!("{AI_ERROR_LABEL}: {detail}")
}

/// Whether `reply` is a labeled error.
pub fn is_error_reply(reply: &str) -> bool {
    reply.starts_with(AI_ERROR_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_label() {
        let reply = error_reply("timeout");
        assert_eq!(reply, "[AI Error]: timeout");
        assert!(is_error_reply(&reply));
        assert!(!is_error_reply("hello"));
    }
}
