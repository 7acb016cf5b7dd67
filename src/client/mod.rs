//! Client abstraction: the capability surface the instrumentation wraps.
//!
//! [`HttpClient`] composes a transport, an ordered interceptor chain, an
//! event-listener factory, and optional cache / connection-pool stat views.
//! Rebuilding a client through [`HttpClient::to_builder`] preserves every
//! part, which is how the instrumentation layer attaches itself without
//! touching request semantics.

pub mod cache;
pub mod events;
pub mod interceptor;
pub mod pool;
pub mod transport;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::HttpError;

use self::cache::HttpCache;
use self::events::{EventListenerFactory, NoopListenerFactory};
use self::interceptor::{Chain, Interceptor};
use self::pool::ConnectionPool;
use self::transport::HttpTransport;

/// Outgoing request with a fully buffered body.
pub type Request = http::Request<Bytes>;

/// Response with a fully buffered body.
pub type Response = http::Response<Bytes>;

/// An HTTP client: a transport plus the hooks wrapped around it.
///
/// Cloning is cheap; all parts are shared behind `Arc`.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    listener_factory: Arc<dyn EventListenerFactory>,
    cache: Option<Arc<dyn HttpCache>>,
    pool: Option<Arc<dyn ConnectionPool>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("interceptors", &self.interceptors.len())
            .field("has_cache", &self.cache.is_some())
            .field("has_pool", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Client over `transport` with no interceptors, a no-op listener
    /// factory, and no cache or pool views.
    pub fn new(transport: impl HttpTransport + 'static) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: impl HttpTransport + 'static) -> HttpClientBuilder {
        HttpClientBuilder {
            transport: Arc::new(transport),
            interceptors: Vec::new(),
            listener_factory: Arc::new(NoopListenerFactory),
            cache: None,
            pool: None,
        }
    }

    /// Builder pre-populated with every part of this client.
    pub fn to_builder(&self) -> HttpClientBuilder {
        HttpClientBuilder {
            transport: Arc::clone(&self.transport),
            interceptors: self.interceptors.clone(),
            listener_factory: Arc::clone(&self.listener_factory),
            cache: self.cache.clone(),
            pool: self.pool.clone(),
        }
    }

    /// The cache stat view, if the host configured one.
    pub fn cache(&self) -> Option<&Arc<dyn HttpCache>> {
        self.cache.as_ref()
    }

    /// The connection-pool stat view, if the transport exposes one.
    pub fn connection_pool(&self) -> Option<&Arc<dyn ConnectionPool>> {
        self.pool.as_ref()
    }

    pub fn event_listener_factory(&self) -> &Arc<dyn EventListenerFactory> {
        &self.listener_factory
    }

    /// Execute one request.
    ///
    /// Creates the per-call listener, emits `call_start`, runs the
    /// interceptor chain down to the transport, then emits `call_end` or
    /// `call_failed`. The chain's result is returned exactly as produced.
    pub async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let listener = self.listener_factory.create(&request);
        listener.call_start(&request);
        let chain = Chain {
            interceptors: &self.interceptors,
            transport: &*self.transport,
            listener: &*listener,
        };
        let result = chain.proceed(request).await;
        match &result {
            Ok(_) => listener.call_end(),
            Err(error) => listener.call_failed(error),
        }
        result
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    transport: Arc<dyn HttpTransport>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    listener_factory: Arc<dyn EventListenerFactory>,
    cache: Option<Arc<dyn HttpCache>>,
    pool: Option<Arc<dyn ConnectionPool>>,
}

impl HttpClientBuilder {
    /// Replace the transport.
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Append an interceptor. Later interceptors run closer to the wire.
    pub fn add_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Replace the event-listener factory.
    pub fn event_listener_factory(
        mut self,
        factory: impl EventListenerFactory + 'static,
    ) -> Self {
        self.listener_factory = Arc::new(factory);
        self
    }

    /// Attach a cache stat view.
    pub fn cache(mut self, cache: impl HttpCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Attach a connection-pool stat view.
    pub fn connection_pool(mut self, pool: impl ConnectionPool + 'static) -> Self {
        self.pool = Some(Arc::new(pool));
        self
    }

    pub fn build(self) -> HttpClient {
        HttpClient {
            transport: self.transport,
            interceptors: self.interceptors,
            listener_factory: self.listener_factory,
            cache: self.cache,
            pool: self.pool,
        }
    }
}
