//! Process configuration, read from the environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a sarcastic assistant.";
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 20;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_DOCUMENT_PATH: &str = "data/document.txt";
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_PRICE_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Which request pipeline the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// History plus completion, nothing else.
    Plain,
    /// Adds similarity lookup over one local document.
    Retrieval,
    /// Adds the crypto price function.
    Tools,
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatMode::Plain => write!(f, "plain"),
            ChatMode::Retrieval => write!(f, "retrieval"),
            ChatMode::Tools => write!(f, "tools"),
        }
    }
}

impl FromStr for ChatMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(ChatMode::Plain),
            "retrieval" | "rag" => Ok(ChatMode::Retrieval),
            "tools" => Ok(ChatMode::Tools),
            other => Err(Error::Config(format!("Invalid chat mode: '{}'", other))),
        }
    }
}

/// Top-level chatrelay configuration.
#[derive(Clone)]
pub struct ChatRelayConfig {
    /// HTTP server port.
    pub port: u16,
    pub mode: ChatMode,
    /// Seed message for every new conversation.
    pub system_prompt: String,
    /// Non-system messages kept per conversation (0 keeps everything).
    pub max_history_messages: usize,
    /// Key for signing session cookies.
    pub session_secret: String,
    /// Idle time after which a session is dropped.
    pub session_ttl: Duration,
    /// Source text for retrieval mode.
    pub document_path: PathBuf,
    pub chunk_size: usize,
    pub top_k: usize,
    pub price_api_base_url: String,
    /// Timeout applied to every outbound HTTP request.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ChatRelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRelayConfig")
            .field("port", &self.port)
            .field("mode", &self.mode)
            .field("system_prompt", &self.system_prompt)
            .field("max_history_messages", &self.max_history_messages)
            .field("session_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("document_path", &self.document_path)
            .field("chunk_size", &self.chunk_size)
            .field("top_k", &self.top_k)
            .field("price_api_base_url", &self.price_api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ChatRelayConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("CHATRELAY_MODE") {
            Some(m) => m.parse()?,
            None => ChatMode::Plain,
        };

        let session_secret = match lookup("SESSION_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("SESSION_SECRET not set; sessions will not survive a restart");
                format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
            }
        };

        let chunk_size = parse_or(&lookup, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(Error::Config("CHUNK_SIZE must be greater than zero".into()));
        }

        let top_k = parse_or(&lookup, "RETRIEVAL_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(Error::Config("RETRIEVAL_TOP_K must be greater than zero".into()));
        }

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            mode,
            system_prompt: lookup("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_history_messages: parse_or(
                &lookup,
                "MAX_HISTORY_MESSAGES",
                DEFAULT_MAX_HISTORY_MESSAGES,
            )?,
            session_secret,
            session_ttl: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?),
            document_path: lookup("DOCUMENT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_PATH)),
            chunk_size,
            top_k,
            price_api_base_url: lookup("PRICE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PRICE_API_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ChatRelayConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ChatRelayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.mode, ChatMode::Plain);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.top_k, 3);
        assert!(!config.session_secret.is_empty());
    }

    #[test]
    fn test_debug_redacts_session_secret() {
        let config = config_from(&[("SESSION_SECRET", "hunter2-signing-key")]).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2-signing-key"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("chunk_size: 500"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("CHATRELAY_MODE", "tools"),
            ("SESSION_SECRET", "s3cret"),
            ("MAX_HISTORY_MESSAGES", "4"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.mode, ChatMode::Tools);
        assert_eq!(config.session_secret, "s3cret");
        assert_eq!(config.max_history_messages, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(config_from(&[("PORT", "abc")]), Err(Error::Config(_))));
        assert!(matches!(config_from(&[("CHATRELAY_MODE", "voice")]), Err(Error::Config(_))));
        assert!(matches!(config_from(&[("CHUNK_SIZE", "0")]), Err(Error::Config(_))));
    }

    #[test]
    fn test_mode_aliases() {
        assert_eq!("RAG".parse::<ChatMode>().unwrap(), ChatMode::Retrieval);
        assert_eq!(ChatMode::Retrieval.to_string(), "retrieval");
    }
}
