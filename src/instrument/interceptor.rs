//! The network-request interceptor.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::interceptor::{Chain, Interceptor};
use crate::client::{Request, Response};
use crate::error::HttpError;
use crate::instrument::metrics::{RequestMetrics, RequestTimer};

/// Counts and times each call that reaches the wire.
///
/// Installed last in the chain so that earlier interceptors (retries,
/// caching layers) sit outside the measurement and every increment
/// corresponds to one actual transport execution. The chain's result passes
/// through untouched: no response rewriting, no error conversion.
pub struct InstrumentedInterceptor {
    metrics: Arc<RequestMetrics>,
}

impl InstrumentedInterceptor {
    pub fn new(metrics: Arc<RequestMetrics>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl Interceptor for InstrumentedInterceptor {
    async fn intercept(&self, request: Request, chain: Chain<'_>) -> Result<Response, HttpError> {
        // The guard completes on drop too, so an unwinding transport or a
        // cancelled call still decrements in-flight and counts a completion.
        let timer = RequestTimer::start(Arc::clone(&self.metrics));
        let result = chain.proceed(request).await;
        timer.finish();
        result
    }
}
