//! AI reply collaborator for Duochat.
//!
//! # Architecture
//!
//! - [`traits::ReplyProvider`] — "given text, returns text or a labeled error string"
//! - [`http_provider::HttpProvider`] — OpenAI-compatible HTTP client (Groq by default)
//! - [`http_provider::create_provider`] — builder from the `ai` config section
//! - [`exchange::ask_ai`] — run an `/ai` prompt and record the exchange

pub mod exchange;
pub mod http_provider;
pub mod traits;
pub mod types;

// Re-export main types for convenience
pub use exchange::ask_ai;
pub use http_provider::{create_provider, HttpProvider, GROQ_API_BASE};
pub use traits::{ReplyProvider, AI_ERROR_LABEL};
