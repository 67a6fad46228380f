use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::StoreError;

/// TTL reported for a key that does not exist.
pub const NO_KEY: i64 = -2;

/// TTL reported for a key that exists without an expiry.
pub const NO_EXPIRY: i64 = -1;

/// The atomic operations the window protocol issues against a key-value store.
///
/// TTLs are in milliseconds and use the [`NO_KEY`] and [`NO_EXPIRY`] sentinels.
/// Stores must be `Send` and `Sync` so a limiter can be shared across tasks.
#[async_trait]
pub trait WindowStore: Debug + Send + Sync {
    /// Atomically run, with no other writer interleaved on `key`:
    ///
    /// 1. If `key` is absent, set it to `0` expiring in `window_ms`.
    /// 2. Increment `key` by `weight`.
    /// 3. Read the remaining TTL of `key`.
    ///
    /// Returns the incremented value and the TTL.
    async fn incr_window(
        &self,
        key: &str,
        weight: i64,
        window_ms: i64,
    ) -> Result<(i64, i64), StoreError>;

    /// Unconditionally set `key` to expire in `window_ms`.
    async fn rearm(&self, key: &str, window_ms: i64) -> Result<(), StoreError>;

    /// Atomically read the raw value and TTL of `key`.
    ///
    /// An absent key reads as `None`. Must not create or modify the key.
    async fn snapshot(&self, key: &str) -> Result<(Option<String>, i64), StoreError>;
}

#[async_trait]
impl<S> WindowStore for Arc<S>
where
    S: WindowStore + ?Sized,
{
    async fn incr_window(
        &self,
        key: &str,
        weight: i64,
        window_ms: i64,
    ) -> Result<(i64, i64), StoreError> {
        (**self).incr_window(key, weight, window_ms).await
    }

    async fn rearm(&self, key: &str, window_ms: i64) -> Result<(), StoreError> {
        (**self).rearm(key, window_ms).await
    }

    async fn snapshot(&self, key: &str) -> Result<(Option<String>, i64), StoreError> {
        (**self).snapshot(key).await
    }
}
