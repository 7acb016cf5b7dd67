//! Per-call lifecycle events.
//!
//! A transport reports the phases of a call — DNS resolution, connecting,
//! writing the request, reading the response — to an [`EventListener`]. One
//! listener instance exists per call, created by an [`EventListenerFactory`]
//! right before the call starts, so listener implementations may keep
//! per-call state without worrying about other calls.
//!
//! Every callback has a no-op default body: listeners implement only the
//! phases they care about, and transports emit only the phases they can
//! actually observe. A transport that cannot see DNS resolution (because a
//! lower layer hides it) simply never calls the DNS hooks.

use std::net::{IpAddr, SocketAddr};

use http::StatusCode;

use crate::client::Request;
use crate::error::HttpError;

/// Observer for the lifecycle phases of a single call.
///
/// Paired phases are always emitted in start/end order; `*_failed` replaces
/// the corresponding end event. Callbacks must be cheap and non-blocking:
/// they run inline on the request path.
pub trait EventListener: Send + Sync {
    /// The call was handed to the client, before any interceptor runs.
    fn call_start(&self, _request: &Request) {}

    /// Host name resolution started.
    fn dns_start(&self, _host: &str) {}

    /// Host name resolution finished.
    fn dns_end(&self, _host: &str, _addresses: &[IpAddr]) {}

    /// A new socket connection attempt started.
    fn connect_start(&self, _address: SocketAddr) {}

    /// The socket connection was established.
    fn connect_end(&self, _address: SocketAddr) {}

    /// The socket connection attempt failed.
    fn connect_failed(&self, _address: SocketAddr, _error: &HttpError) {}

    /// A connection (new or pooled) was checked out for this call.
    fn connection_acquired(&self, _id: u64) {}

    /// The call's connection was returned to the pool.
    fn connection_released(&self, _id: u64) {}

    fn request_headers_start(&self) {}

    fn request_headers_end(&self, _header_bytes: u64) {}

    fn request_body_start(&self) {}

    fn request_body_end(&self, _body_bytes: u64) {}

    fn response_headers_start(&self) {}

    fn response_headers_end(&self, _status: StatusCode) {}

    fn response_body_start(&self) {}

    fn response_body_end(&self, _body_bytes: u64) {}

    /// The call finished successfully. Terminal; pairs with `call_start`.
    fn call_end(&self) {}

    /// The call finished with an error. Terminal; pairs with `call_start`.
    fn call_failed(&self, _error: &HttpError) {}
}

/// Creates one [`EventListener`] per call.
pub trait EventListenerFactory: Send + Sync {
    fn create(&self, request: &Request) -> Box<dyn EventListener>;
}

/// Listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl EventListener for NoopListener {}

/// Factory producing [`NoopListener`]s; the default on an uninstrumented
/// client.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListenerFactory;

impl EventListenerFactory for NoopListenerFactory {
    fn create(&self, _request: &Request) -> Box<dyn EventListener> {
        Box::new(NoopListener)
    }
}
