use std::ops::ControlFlow;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use futures::future::BoxFuture;
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use tokio::time::timeout;
use tower::BoxError;
use tower::Service;
use tracing::debug;

use shot_window::FixedWindowLimiter;
use shot_window::RateLimitSpec;
use shot_window::Reason;
use shot_window::WindowStore;

use crate::error::ShotError;
use crate::layer::KeyFn;
use crate::layer::WeightFn;

#[derive(Clone, Debug)]
struct WindowLimitServiceMetrics {
    rate_limited: Counter<u64>,
    store_errors: Counter<u64>,
}

pub struct WindowLimitService<St, S, Req> {
    inner: S,
    limiter: Arc<FixedWindowLimiter<St>>,
    policy: RateLimitSpec,
    key_fn: Arc<KeyFn<Req>>,
    weight_fn: Option<Arc<WeightFn<Req>>>,
    timeout: Option<Duration>,
    instruments: WindowLimitServiceMetrics,
}

// Manually implement Clone because the key functions are shared trait objects
impl<St, S, Req> Clone for WindowLimitService<St, S, Req>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: Arc::clone(&self.limiter),
            policy: self.policy.clone(),
            key_fn: Arc::clone(&self.key_fn),
            weight_fn: self.weight_fn.clone(),
            timeout: self.timeout,
            instruments: self.instruments.clone(),
        }
    }
}

impl<St, S, Req> Service<Req> for WindowLimitService<St, S, Req>
where
    St: WindowStore + 'static,
    S: Service<Req, Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<S::Response, BoxError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The limit is checked per request in `call`, once the action id is known
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let action_id = format!("{}{}", self.policy.action_id(), (self.key_fn)(&req));
        let spec = self.policy.for_action(action_id);
        let weight = self.weight_fn.as_ref().map_or(1, |weight_fn| weight_fn(&req));

        // Take the service that was driven to readiness, leaving a clone in its place
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let limiter = Arc::clone(&self.limiter);
        let instruments = self.instruments.clone();

        let checked = async move {
            let result = match limiter.increment_by(&spec, weight).await {
                Ok(result) => result,
                Err(err) => {
                    instruments.store_errors.add(1, &[]);
                    return Err(BoxError::from(ShotError::Store(err.to_string())));
                }
            };

            if let ControlFlow::Break(Reason::Overloaded { retry_after }) = result.as_flow() {
                debug!(
                    action_id = spec.action_id(),
                    value = result.new_value,
                    "rate limited"
                );
                instruments.rate_limited.add(
                    1,
                    &[KeyValue::new("limit", spec.limit().get() as i64)],
                );
                return Err(BoxError::from(ShotError::RateLimited { retry_after }));
            }

            inner.call(req).await
        };

        match self.timeout {
            Some(duration) => Box::pin(async move {
                timeout(duration, checked)
                    .await
                    .map_err(|_| BoxError::from(ShotError::Timeout))?
            }),
            None => Box::pin(checked),
        }
    }
}

impl<St, S, Req> WindowLimitService<St, S, Req> {
    pub fn new(
        inner: S,
        limiter: Arc<FixedWindowLimiter<St>>,
        policy: RateLimitSpec,
        key_fn: Arc<KeyFn<Req>>,
    ) -> Self {
        let meter = global::meter("window_limit_service");
        let instruments = WindowLimitServiceMetrics {
            rate_limited: meter.u64_counter("rate_limited").build(),
            store_errors: meter.u64_counter("store_errors").build(),
        };

        Self {
            inner,
            limiter,
            policy,
            key_fn,
            weight_fn: None,
            timeout: None,
            instruments,
        }
    }

    pub fn with_weight(mut self, weight_fn: Arc<WeightFn<Req>>) -> Self {
        self.weight_fn = Some(weight_fn);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
