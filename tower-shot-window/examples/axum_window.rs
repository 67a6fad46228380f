use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, error_handling::HandleErrorLayer, extract::Request, http::StatusCode,
    response::IntoResponse, routing::get,
};
use shot_window::{FixedWindowLimiter, RateLimitSpec, RedisStore, RedisStoreConfig};
use tower::BoxError;
use tower::ServiceBuilder;
use tower_shot_window::{ShotError, WindowLimitLayer};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 1. Connect to the shared store
    let store = RedisStore::connect(&RedisStoreConfig::from_env()).await?;
    let limiter = Arc::new(FixedWindowLimiter::new(store));

    // 2. At most 10 views per client every 3 minutes, across every replica
    let policy = RateLimitSpec::new(
        "view-",
        NonZeroU64::new(10).ok_or("limit must be non-zero")?,
        Duration::from_secs(3 * 60),
    )?;
    let window_layer = WindowLimitLayer::new(limiter, policy, |req: &Request| {
        req.headers()
            .get("x-client-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("anonymous")
            .to_string()
    })
    .with_timeout(Duration::from_millis(500));

    // 3. Build the Router
    let app = Router::new()
        .route("/", get(|| async { "Hello, Shot!" }))
        .layer(
            ServiceBuilder::new()
                // The outermost layer: catches BoxError and returns Response
                .layer(HandleErrorLayer::new(handle_shot_error))
                .layer(window_layer)
                // Converts the Route's Infallible to BoxError
                .map_err(BoxError::from),
        );

    // 4. Serve
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    println!("📡 Listening on http://127.0.0.1:3000");

    axum::serve(listener, app).await?;
    Ok(())
}

/// The signature must match BoxError -> IntoResponse
async fn handle_shot_error(err: tower::BoxError) -> impl IntoResponse {
    if let Some(shot_err) = err.downcast_ref::<ShotError>() {
        shot_err.clone().into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Service Error").into_response()
    }
}
