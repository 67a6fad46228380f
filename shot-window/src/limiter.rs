use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::IncrementResult;
use crate::RateLimitSpec;
use crate::StatusResult;
use crate::WindowError;
use crate::key::parse_counter;
use crate::key::store_key;
use crate::store::WindowStore;

/// A fixed window rate limiter over a shared [`WindowStore`].
///
/// The limiter keeps no state of its own; every caller sharing the store (in this
/// process or another) sees the same counters. Build one at startup and clone it.
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter<S> {
    store: S,
}

impl<S> FixedWindowLimiter<S>
where
    S: WindowStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Count one action against `spec`.
    pub async fn increment(&self, spec: &RateLimitSpec) -> Result<IncrementResult, WindowError> {
        self.increment_by(spec, 1).await
    }

    /// Count an action of the given weight against `spec`.
    ///
    /// The first increment of a window creates the counter and sets its expiry to the
    /// spec's window. Later increments in the same window only advance the counter.
    ///
    /// If the store reports a counter with no expiry, or one expiring later than the
    /// spec's window allows (the window was shortened while a longer one was live),
    /// the expiry is re-armed to the spec's window with a second, separate request.
    /// A concurrent caller may re-arm the same key at the same moment, setting the
    /// same expiry twice.
    ///
    /// # Errors
    ///
    /// Any store failure, from the increment or the re-arm, is returned unchanged.
    pub async fn increment_by(
        &self,
        spec: &RateLimitSpec,
        weight: i64,
    ) -> Result<IncrementResult, WindowError> {
        let key = store_key(spec.action_id());
        let window_ms = spec.window_millis();

        let (new_value, observed_ttl) = self.store.incr_window(&key, weight, window_ms).await?;

        let ttl = if observed_ttl < 0 || observed_ttl > window_ms {
            debug!(key = %key, observed_ttl, window_ms, "re-arming window expiry");
            self.store.rearm(&key, window_ms).await?;
            window_ms
        } else {
            observed_ttl
        };

        Ok(IncrementResult {
            new_value,
            remaining: Duration::from_millis(ttl as u64),
            is_over_limit: spec.is_over_limit(new_value),
        })
    }

    /// Read the counter and remaining window time for `action_id`.
    ///
    /// An action with no live window reads as zero with nothing remaining. The
    /// store is never written.
    pub async fn status(&self, action_id: &str) -> Result<StatusResult, WindowError> {
        let key = store_key(action_id);
        let (raw, ttl) = self.store.snapshot(&key).await?;

        let current_value = match parse_counter(raw.as_deref()) {
            Ok(value) => value,
            Err(error) => {
                warn!(key = %key, %error, "treating malformed counter as zero");
                0
            }
        };

        Ok(StatusResult {
            current_value,
            remaining: Duration::from_millis(ttl.max(0) as u64),
        })
    }
}
