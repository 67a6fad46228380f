use std::num::NonZeroU64;
use std::time::Duration;

use crate::WindowError;

/// An immutable rate policy for one action.
///
/// Two specs may share an `action_id` with different limits or windows. They then
/// address the same counter, which is how a policy is changed while windows are live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitSpec {
    action_id: String,
    limit: NonZeroU64,
    window: Duration,
}

impl RateLimitSpec {
    /// Creates a new `RateLimitSpec`.
    ///
    /// # Arguments
    ///
    /// * `action_id` - Identifies the action to be limited, e.g. `view-<user id>`.
    /// * `limit` - The maximum number of actions allowed within a window (inclusive).
    /// * `window` - The duration of the fixed window. Truncated to whole milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidWindow`] if `window` is under one millisecond.
    pub fn new(
        action_id: impl Into<String>,
        limit: NonZeroU64,
        window: Duration,
    ) -> Result<Self, WindowError> {
        if window.as_millis() == 0 {
            return Err(WindowError::InvalidWindow(window));
        }
        Ok(Self {
            action_id: action_id.into(),
            limit,
            window: Duration::from_millis(window.as_millis() as u64),
        })
    }

    /// The same policy applied to another action.
    pub fn for_action(&self, action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            limit: self.limit,
            window: self.window,
        }
    }

    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    pub fn limit(&self) -> NonZeroU64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// The window as the store sees it.
    pub fn window_millis(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// Is `value` strictly over the inclusive limit?
    pub fn is_over_limit(&self, value: i64) -> bool {
        u64::try_from(value).is_ok_and(|v| v > self.limit.get())
    }
}
