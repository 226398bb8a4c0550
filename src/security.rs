//! Anti-forgery tokens for the search form.
//!
//! A token is a keyed blake3 digest over a time tick, an action name and the
//! caller's session id. A token stays valid for the current tick and the one
//! before it, so its effective life is between half and all of the configured
//! lifetime.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

use crate::config::SecurityConfig;

pub const SEARCH_ACTION: &str = "news_search";

const KEY_CONTEXT: &str = "news-search 2024-03-15 anti-forgery token key";

/// Issues and checks anti-forgery tokens bound to a session.
pub trait TokenVerifier: Send + Sync {
    fn issue(&self, session: &str) -> String;

    fn verify(&self, token: &str, session: &str) -> bool;
}

pub struct NonceManager {
    key: [u8; 32],
    action: String,
    lifetime: Duration,
}

impl NonceManager {
    pub fn new(secret: &str, action: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            action: action.into(),
            lifetime,
        }
    }

    /// Build from config, falling back to a random per-process secret.
    pub fn from_config(config: &SecurityConfig) -> Self {
        let secret = if config.secret.is_empty() {
            debug!("No anti-forgery secret configured; generating one for this process");
            uuid::Uuid::new_v4().to_string()
        } else {
            config.secret.clone()
        };

        Self::new(&secret, SEARCH_ACTION, config.token_lifetime())
    }

    fn tick(&self, now: DateTime<Utc>) -> i64 {
        let half = (self.lifetime.as_secs() / 2).max(1) as i64;
        now.timestamp().div_euclid(half) + 1
    }

    fn digest(&self, tick: i64, session: &str) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(tick.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.action.as_bytes());
        hasher.update(b"|");
        hasher.update(session.as_bytes());
        hasher.finalize()
    }

    pub fn issue_at(&self, session: &str, now: DateTime<Utc>) -> String {
        self.digest(self.tick(now), session).to_hex().to_string()
    }

    pub fn verify_at(&self, token: &str, session: &str, now: DateTime<Utc>) -> bool {
        let Ok(presented) = blake3::Hash::from_hex(token.trim()) else {
            return false;
        };

        let tick = self.tick(now);
        // blake3::Hash equality is constant-time
        presented == self.digest(tick, session) || presented == self.digest(tick - 1, session)
    }
}

impl TokenVerifier for NonceManager {
    fn issue(&self, session: &str) -> String {
        self.issue_at(session, Utc::now())
    }

    fn verify(&self, token: &str, session: &str) -> bool {
        self.verify_at(token, session, Utc::now())
    }
}
