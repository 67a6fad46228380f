use std::time::Duration;

/// Failures reported by a [`crate::WindowStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The Redis client or server rejected the request.
    #[cfg(feature = "redis")]
    #[error("redis request failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// The store could not be reached or refused to serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The value held at `key` cannot be incremented as an integer.
    #[error("value at {key} is not an integer")]
    NotAnInteger { key: String },

    /// Incrementing the value at `key` would overflow a signed 64 bit integer.
    #[error("increment of {key} would overflow")]
    Overflow { key: String },
}

/// Errors returned by [`crate::FixedWindowLimiter`] and [`crate::RateLimitSpec`].
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// A store request failed. Never retried or defaulted by the limiter.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Windows are expressed in whole milliseconds and must be at least one.
    #[error("window of {0:?} is shorter than one millisecond")]
    InvalidWindow(Duration),
}
