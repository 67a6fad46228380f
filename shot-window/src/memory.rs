use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::StoreError;
use crate::store::NO_EXPIRY;
use crate::store::NO_KEY;
use crate::store::WindowStore;

/// Expired entries are swept roughly once per this many increments.
const EVICTION_INTERVAL: u64 = 100;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }

    fn ttl(&self, now: Instant) -> i64 {
        match self.expires_at {
            None => NO_EXPIRY,
            Some(at) => at.saturating_duration_since(now).as_millis() as i64,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    ops: u64,
}

impl Inner {
    /// Look up `key`, dropping it first if its expiry has passed.
    fn live(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        if self.entries.get(key).is_some_and(|e| !e.is_live(now)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    fn maybe_evict_expired(&mut self, now: Instant) {
        self.ops = self.ops.wrapping_add(1);
        if self.ops % EVICTION_INTERVAL == 0 {
            self.entries.retain(|_, entry| entry.is_live(now));
        }
    }
}

/// An in-process [`WindowStore`].
///
/// Each operation runs under a single lock, which gives the same per-key atomicity
/// Redis gives a transaction. Expiry follows tokio's clock, so paused time in tests
/// drives windows deterministically.
///
/// Clones share the same map. Counters are only shared within one process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner, Instant) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *inner, Instant::now())
    }

    /// Write a raw value, as another writer sharing the store might.
    #[cfg(test)]
    pub(crate) fn seed(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.with_inner(|inner, now| {
            inner.entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: ttl.map(|ttl| now + ttl),
                },
            );
        })
    }
}

fn expiry(now: Instant, window_ms: i64) -> Instant {
    now + Duration::from_millis(window_ms.max(1) as u64)
}

#[async_trait]
impl WindowStore for MemoryStore {
    async fn incr_window(
        &self,
        key: &str,
        weight: i64,
        window_ms: i64,
    ) -> Result<(i64, i64), StoreError> {
        self.with_inner(|inner, now| -> Result<(i64, i64), StoreError> {
            inner.maybe_evict_expired(now);

            let current = match inner.live(key, now) {
                Some(entry) => entry
                    .value
                    .parse::<i64>()
                    .map_err(|_| StoreError::NotAnInteger {
                        key: key.to_string(),
                    })?,
                None => 0,
            };
            let value = current
                .checked_add(weight)
                .ok_or_else(|| StoreError::Overflow {
                    key: key.to_string(),
                })?;

            let entry = inner.entries.entry(key.to_string()).or_insert(Entry {
                value: String::new(),
                expires_at: Some(expiry(now, window_ms)),
            });
            entry.value = value.to_string();
            Ok((value, entry.ttl(now)))
        })
    }

    async fn rearm(&self, key: &str, window_ms: i64) -> Result<(), StoreError> {
        self.with_inner(|inner, now| {
            if let Some(entry) = inner.live(key, now) {
                entry.expires_at = Some(expiry(now, window_ms));
            }
        });
        Ok(())
    }

    async fn snapshot(&self, key: &str) -> Result<(Option<String>, i64), StoreError> {
        Ok(self.with_inner(|inner, now| match inner.live(key, now) {
            Some(entry) => (Some(entry.value.clone()), entry.ttl(now)),
            None => (None, NO_KEY),
        }))
    }
}
