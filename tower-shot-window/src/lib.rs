//! # Tower Shot Window
//!
//! `tower-shot-window` applies a distributed fixed window rate limit to a
//! [Tower](https://github.com/tower-rs/tower) service.
//!
//! Each request is mapped to an action id and counted with a shared
//! [`shot_window::FixedWindowLimiter`]. Because the counters live in the limiter's
//! store, every replica of a service sharing that store enforces one limit.
//!
//! 1. **Fail Fast**: A request over the limit is rejected immediately with
//!    `ShotError::RateLimited`, carrying the time until its window resets.
//! 2. **Timeouts**: An optional deadline covers the store round trip and the inner
//!    service, failing with `ShotError::Timeout`.
//! 3. **Error Mapping**: Store failures surface as `ShotError::Store`. Errors from
//!    the inner service pass through untouched.
//!
//! ## Feature Flags
//!
//! - `axum`: Enables `IntoResponse` for [`ShotError`], allowing automatic conversion
//!   to HTTP status codes (429, 408, 503).

mod error;
mod layer;
mod service;


pub use error::ShotError;
pub use layer::WindowLimitLayer;
pub use service::WindowLimitService;
