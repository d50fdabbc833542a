//! Chat: message types, per-session conversation buffer with a retention
//! policy, and the completion client for OpenAI-compatible APIs.

pub mod config;
pub mod conversation;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use conversation::{Conversation, RetentionPolicy};
pub use providers::{CompletionClient, OpenAIClient};
pub use types::*;
