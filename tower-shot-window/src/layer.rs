use std::sync::Arc;
use std::time::Duration;

use shot_window::FixedWindowLimiter;
use shot_window::RateLimitSpec;
use shot_window::WindowStore;
use tower::Layer;

use crate::service::WindowLimitService;

pub type KeyFn<Req> = dyn Fn(&Req) -> String + Send + Sync;
pub type WeightFn<Req> = dyn Fn(&Req) -> i64 + Send + Sync;

/// Applies a distributed fixed window rate limit to requests.
///
/// Every request is counted against the action `policy.action_id() + key_fn(&req)`
/// using the policy's limit and window. With a policy for `"view-"` and a key
/// function returning a user id, each user gets their own `view-<id>` counter.
pub struct WindowLimitLayer<St, Req> {
    limiter: Arc<FixedWindowLimiter<St>>,
    policy: RateLimitSpec,
    key_fn: Arc<KeyFn<Req>>,
    weight_fn: Option<Arc<WeightFn<Req>>>,
    timeout: Option<Duration>,
}

// Note: Deriving Clone would require St: Clone and Req: Clone.
impl<St, Req> Clone for WindowLimitLayer<St, Req> {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            policy: self.policy.clone(),
            key_fn: Arc::clone(&self.key_fn),
            weight_fn: self.weight_fn.clone(),
            timeout: self.timeout,
        }
    }
}

impl<St, Req> WindowLimitLayer<St, Req>
where
    St: WindowStore,
{
    /// Create a WindowLimitLayer
    ///
    /// # Arguments
    ///
    /// * `limiter` - The limiter shared by every service built from this layer.
    /// * `policy` - Limit and window for each action. Its action id prefixes every key.
    /// * `key_fn` - Maps a request to the part of the action id that identifies it.
    pub fn new<K>(limiter: Arc<FixedWindowLimiter<St>>, policy: RateLimitSpec, key_fn: K) -> Self
    where
        K: Fn(&Req) -> String + Send + Sync + 'static,
    {
        WindowLimitLayer {
            limiter,
            policy,
            key_fn: Arc::new(key_fn),
            weight_fn: None,
            timeout: None,
        }
    }

    /// Set how much each request advances its counter.
    ///
    /// Requests count as one by default.
    pub fn with_weight<W>(mut self, weight_fn: W) -> Self
    where
        W: Fn(&Req) -> i64 + Send + Sync + 'static,
    {
        self.weight_fn = Some(Arc::new(weight_fn));
        self
    }

    /// Set a unified timeout for both the rate limit check and request execution.
    ///
    /// If the total time exceeds this duration, the service
    /// will return `ShotError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl<St, Req, S> Layer<S> for WindowLimitLayer<St, Req> {
    type Service = WindowLimitService<St, S, Req>;

    fn layer(&self, service: S) -> Self::Service {
        let mut svc = WindowLimitService::new(
            service,
            self.limiter.clone(),
            self.policy.clone(),
            self.key_fn.clone(),
        );
        if let Some(weight_fn) = &self.weight_fn {
            svc = svc.with_weight(weight_fn.clone());
        }
        if let Some(timeout) = self.timeout {
            svc = svc.with_timeout(timeout);
        }
        svc
    }
}
