//! Time-to-live cache for the Jira reads.
//!
//! Entries are keyed by the endpoint and its parameters. The clock is injected, so tests can
//! move time forward without sleeping.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: &'static str,
    pub params: Vec<String>,
}

impl CacheKey {
    #[must_use]
    pub fn new<I, S>(endpoint: &'static str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CacheKey {
            endpoint,
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct TtlCache<V: Clone> {
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: HashMap<CacheKey, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        TtlCache {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
            entries: HashMap::new(),
        }
    }

    /// A copy of the cached value, unless it has expired. Expired entries are evicted.
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                debug!("Cache entry {key:?} has expired");
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: CacheKey, value: V) {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    pub fn invalidate(&mut self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Drops every entry read from `endpoint`, whatever the parameters
    pub fn invalidate_endpoint(&mut self, endpoint: &str) {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.endpoint != endpoint);
        debug!(
            "Invalidated {} cache entries of '{endpoint}'",
            before - self.entries.len()
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
