//! Interceptor chain.
//!
//! Interceptors wrap the network call: each one receives the request plus a
//! [`Chain`] handle and decides whether to short-circuit or proceed to the
//! next interceptor. The last `proceed` hands the request to the transport.
//! Interceptors added later sit closer to the wire.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::events::EventListener;
use crate::client::transport::HttpTransport;
use crate::client::{Request, Response};
use crate::error::HttpError;

/// A hook wrapping each outgoing call.
///
/// Implementations must forward the result of [`Chain::proceed`] unchanged
/// unless rewriting it is their explicit job; observability interceptors in
/// particular must never alter responses or swallow errors.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, request: Request, chain: Chain<'_>) -> Result<Response, HttpError>;
}

/// The remainder of the interceptor chain for one call.
pub struct Chain<'a> {
    pub(crate) interceptors: &'a [Arc<dyn Interceptor>],
    pub(crate) transport: &'a dyn HttpTransport,
    pub(crate) listener: &'a dyn EventListener,
}

impl Chain<'_> {
    /// Run the rest of the chain. When no interceptors remain, executes the
    /// request on the transport.
    pub async fn proceed(self, request: Request) -> Result<Response, HttpError> {
        match self.interceptors.split_first() {
            Some((next, rest)) => {
                let chain = Chain {
                    interceptors: rest,
                    transport: self.transport,
                    listener: self.listener,
                };
                next.intercept(request, chain).await
            }
            None => self.transport.execute(request, self.listener).await,
        }
    }
}
