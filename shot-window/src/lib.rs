//! # shot-window
//!
//! `shot-window` provides a distributed fixed window rate limiter backed by a shared,
//! atomic key-value store.
//!
//! ## Core Philosophy
//!
//! Many callers, possibly on different machines, must agree on a single counter per
//! rate limited action. Rather than coordinating in-process, `shot-window` pushes all
//! coordination into the store: every increment is a single atomic unit that
//! initialises the window, advances the counter and reads the remaining window time.
//!
//! ## Key Concepts
//!
//! * **Stateless Limiter**: [`FixedWindowLimiter`] holds nothing but a store handle.
//! * **Anchored Windows**: A window starts with the first increment for an action and
//!   lasts for the policy's duration. The store's key expiry ends it.
//! * **Store Trait**: [`WindowStore`] is the seam between the protocol and a backend.
//!   [`RedisStore`] is provided for distributed use, [`MemoryStore`] for a single process.
//!
//! ## Example
//!
//! ```rust
//! use std::num::NonZeroU64;
//! use std::time::Duration;
//!
//! use shot_window::FixedWindowLimiter;
//! use shot_window::MemoryStore;
//! use shot_window::RateLimitSpec;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), shot_window::WindowError> {
//! let limiter = FixedWindowLimiter::new(MemoryStore::new());
//! let spec = RateLimitSpec::new(
//!     "view-42",
//!     NonZeroU64::new(10).unwrap(),
//!     Duration::from_secs(180),
//! )?;
//!
//! let result = limiter.increment(&spec).await?;
//! if !result.is_over_limit {
//!     // Action allowed
//! }
//! # Ok(())
//! # }
//! ```

use std::ops::ControlFlow;
use std::time::Duration;

mod error;
mod key;
mod limiter;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod spec;
mod store;

pub use error::StoreError;
pub use error::WindowError;
pub use key::CounterParseError;
pub use key::KEY_PREFIX;
pub use key::action_id_of;
pub use key::parse_counter;
pub use key::store_key;
pub use limiter::FixedWindowLimiter;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStoreConfig;
pub use spec::RateLimitSpec;
pub use store::NO_EXPIRY;
pub use store::NO_KEY;
pub use store::WindowStore;

/// Reasons why a request might be rejected by a limiter.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    Overloaded { retry_after: Duration },
}

/// The outcome of advancing an action's counter.
#[derive(Debug, Clone, PartialEq)]
pub struct IncrementResult {
    /// Number of actions counted in the current window, including this one.
    pub new_value: i64,
    /// Time until the window resets and the counter restarts.
    pub remaining: Duration,
    /// True if `new_value` is strictly greater than the limit.
    pub is_over_limit: bool,
}

impl IncrementResult {
    pub fn remaining_millis(&self) -> u64 {
        self.remaining.as_millis() as u64
    }

    /// Express the result as a flow decision.
    ///
    /// Over-limit results break with a retry hint equal to the remaining window time.
    pub fn as_flow(&self) -> ControlFlow<Reason> {
        if self.is_over_limit {
            ControlFlow::Break(Reason::Overloaded {
                retry_after: self.remaining,
            })
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// A point in time snapshot of an action's counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusResult {
    /// Number of actions counted in the current window.
    pub current_value: i64,
    /// Time until the window resets. Zero when no window is active.
    pub remaining: Duration,
}

impl StatusResult {
    pub fn remaining_millis(&self) -> u64 {
        self.remaining.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_breaks_only_when_over_limit() {
        let mut result = IncrementResult {
            new_value: 3,
            remaining: Duration::from_millis(120),
            is_over_limit: false,
        };
        assert_eq!(result.as_flow(), ControlFlow::Continue(()));

        result.new_value = 4;
        result.is_over_limit = true;
        assert_eq!(
            result.as_flow(),
            ControlFlow::Break(Reason::Overloaded {
                retry_after: Duration::from_millis(120)
            })
        );
        assert_eq!(result.remaining_millis(), 120);
    }
}
