//! Server-side sessions keyed by a signed cookie.
//!
//! Each session owns one conversation behind a `tokio::sync::Mutex`. A
//! request holds that mutex for its whole pipeline, so turns within a
//! session are serialized and sessions never share history.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use chatrelay_chat::{Conversation, RetentionPolicy};
use chatrelay_core::{ChatRelayConfig, Error, Result};

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "chatrelay_session";

/// How often idle sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type HmacSha256 = Hmac<Sha256>;

pub struct SessionEntry {
    pub conversation: Conversation,
    last_seen: Instant,
}

/// A resolved session for one request.
pub struct SessionHandle {
    pub id: String,
    /// True when the caller had no valid cookie and one must be issued.
    pub is_new: bool,
    entry: Arc<Mutex<SessionEntry>>,
}

impl SessionHandle {
    /// Wait for exclusive access to the session's conversation.
    pub async fn lock(&self) -> MutexGuard<'_, SessionEntry> {
        let mut entry = self.entry.lock().await;
        entry.last_seen = Instant::now();
        entry
    }
}

pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<SessionEntry>>>,
    mac: HmacSha256,
    system_prompt: String,
    policy: RetentionPolicy,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(
        secret: &str,
        system_prompt: impl Into<String>,
        policy: RetentionPolicy,
        ttl: Duration,
    ) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid session secret: {}", e)))?;
        Ok(Self {
            sessions: DashMap::new(),
            mac,
            system_prompt: system_prompt.into(),
            policy,
            ttl,
        })
    }

    pub fn from_config(config: &ChatRelayConfig) -> Result<Self> {
        Self::new(
            &config.session_secret,
            config.system_prompt.clone(),
            RetentionPolicy::window(config.max_history_messages),
            config.session_ttl,
        )
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session for the request's cookie, created lazily. Missing or
    /// tampered cookies get a brand new session id.
    pub fn resolve(&self, headers: &HeaderMap) -> SessionHandle {
        let existing = read_cookie(headers, SESSION_COOKIE).and_then(|v| self.verify(&v));
        let (id, is_new) = match existing {
            Some(id) => (id, false),
            None => (uuid::Uuid::new_v4().to_string(), true),
        };

        let entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| {
                debug!("Starting conversation for session {}", id);
                Arc::new(Mutex::new(SessionEntry {
                    conversation: Conversation::new(self.system_prompt.clone(), self.policy),
                    last_seen: Instant::now(),
                }))
            })
            .clone();

        SessionHandle { id, is_new, entry }
    }

    /// Cookie value: `{id}.{hex hmac}`.
    pub fn sign(&self, id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        format!("{}.{}", id, hex::encode(mac.finalize().into_bytes()))
    }

    /// The session id if `value` carries a valid signature.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (id, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id.to_string())
    }

    pub fn set_cookie_header(&self, id: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            self.sign(id)
        )
    }

    /// Drop sessions idle for longer than the TTL. Sessions in use are kept,
    /// including ones resolved by a request that has not locked them yet.
    pub fn prune_idle(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, entry| {
            if Arc::strong_count(entry) > 1 {
                return true;
            }
            match entry.try_lock() {
                Ok(e) => e.last_seen.elapsed() < ttl,
                Err(_) => true,
            }
        });
        before.saturating_sub(self.sessions.len())
    }
}

/// Spawn the background task that sweeps idle sessions.
pub fn start_session_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = state.sessions.prune_idle();
            if removed > 0 {
                info!("Pruned {} idle sessions ({} active)", removed, state.sessions.len());
            }
        }
    });
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}
