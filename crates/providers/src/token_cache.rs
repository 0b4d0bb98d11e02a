//! Cache of provider-reported token rates.

use std::time::{Duration, Instant};

use {async_trait::async_trait, dashmap::DashMap, switchyard_config::TokenConfig};

use crate::error::Result;

/// How long fetched token rates stay fresh in [`MemoryTokenConfigCache`].
pub const DEFAULT_TOKEN_CONFIG_TTL: Duration = Duration::from_secs(30 * 60);

/// Shared key-value store for fetched token rates.
///
/// Concurrent misses for the same key may both fetch; the last write wins.
#[async_trait]
pub trait TokenConfigCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<TokenConfig>>;
    async fn set(&self, key: &str, value: TokenConfig) -> Result<()>;
}

/// Cache key for an endpoint's token rates.
///
/// Rates fetched with a user's own credentials may differ per user, so those
/// entries are scoped to `endpoint:user_id`.
pub fn token_cache_key(endpoint: &str, user_id: &str, user_provided: bool) -> String {
    if user_provided {
        format!("{endpoint}:{user_id}")
    } else {
        endpoint.to_string()
    }
}

struct CacheEntry {
    value: TokenConfig,
    stored_at: Instant,
}

/// In-process [`TokenConfigCache`] with an optional time-to-live.
pub struct MemoryTokenConfigCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Option<Duration>,
}

impl Default for MemoryTokenConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTokenConfigCache {
    pub fn new() -> Self {
        Self::with_ttl(Some(DEFAULT_TOKEN_CONFIG_TTL))
    }

    /// `None` keeps entries until the process exits.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_stale(&self, entry: &CacheEntry) -> bool {
        self.ttl.is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}

#[async_trait]
impl TokenConfigCache for MemoryTokenConfigCache {
    async fn get(&self, key: &str) -> Result<Option<TokenConfig>> {
        if let Some(entry) = self.entries.get(key)
            && !self.is_stale(&entry)
        {
            return Ok(Some(entry.value.clone()));
        }
        self.entries.remove_if(key, |_, entry| self.is_stale(entry));
        Ok(None)
    }

    async fn set(&self, key: &str, value: TokenConfig) -> Result<()> {
        self.entries.insert(key.to_string(), CacheEntry {
            value,
            stored_at: Instant::now(),
        });
        Ok(())
    }
}
