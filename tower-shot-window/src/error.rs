/// Errors produced by the Tower Shot Window middleware.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShotError {
    /// The request exceeded its action's limit for the current window.
    ///
    /// The duration is the time until the window resets.
    /// When the `axum` feature is enabled, this converts to `429 Too Many Requests`
    /// with a `Retry-After` header.
    #[error("Rate limit exceeded; retry after {retry_after:?}")]
    RateLimited {
        /// The duration to wait before retrying.
        retry_after: std::time::Duration,
    },

    /// The store round trip and inner service together exceeded the deadline.
    ///
    /// When the `axum` feature is enabled, this converts to `408 Request Timeout`.
    #[error("Request timed out")]
    Timeout,

    /// The rate limit store failed, so no decision could be made.
    ///
    /// The string contains the `Display` representation of the store error.
    /// When the `axum` feature is enabled, this converts to `503 Service Unavailable`.
    #[error("Rate limit store error: {0}")]
    Store(String),
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ShotError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, msg, headers) = match self {
            Self::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string(), None),
            Self::Timeout => (StatusCode::REQUEST_TIMEOUT, self.to_string(), None),
            Self::RateLimited { retry_after } => {
                // Round up so a client never retries before the window resets
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let val = axum::http::HeaderValue::from(secs.max(1));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    self.to_string(),
                    Some((axum::http::header::RETRY_AFTER, val)),
                )
            }
        };

        let mut response = (status, msg).into_response();
        if let Some((name, value)) = headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
