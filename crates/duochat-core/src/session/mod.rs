//! Login and the per-user interaction cycle.
//!
//! A successful [`Credentials::verify`] yields a [`ChatSession`], the explicit
//! context every handler receives. There is no global logged-in flag: holding
//! a `ChatSession` is being logged in.

pub mod context;
pub mod credentials;

pub use context::{
    parse_ai_command, ChatSession, ChatView, DeleteOutcome, AI_COMMAND_PREFIX,
    DEFAULT_ASSISTANT_NAME,
};
pub use credentials::Credentials;
