//! The event-listener decorator.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use http::StatusCode;

use crate::client::Request;
use crate::client::events::{EventListener, EventListenerFactory};
use crate::error::HttpError;
use crate::instrument::metrics::ListenerMetrics;

/// Per-call start stamps for the paired phases.
#[derive(Default)]
struct PhaseStamps {
    call: Option<Instant>,
    dns: Option<Instant>,
    connect: Option<Instant>,
    request_headers: Option<Instant>,
    request_body: Option<Instant>,
    response_headers: Option<Instant>,
    response_body: Option<Instant>,
}

/// Listener that records phase metrics, then forwards the identical event to
/// a wrapped delegate.
///
/// Metrics always come first: even a panicking delegate observes its event
/// only after the counters moved. One instance exists per call, so the stamp
/// state is never shared across calls; the mutex only serializes phases of a
/// single call arriving from different threads.
pub struct InstrumentedEventListener {
    metrics: Arc<ListenerMetrics>,
    delegate: Box<dyn EventListener>,
    stamps: Mutex<PhaseStamps>,
}

impl InstrumentedEventListener {
    fn stamps(&self) -> MutexGuard<'_, PhaseStamps> {
        self.stamps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventListener for InstrumentedEventListener {
    fn call_start(&self, request: &Request) {
        self.metrics.calls.record_start();
        self.stamps().call = Some(Instant::now());
        self.delegate.call_start(request);
    }

    fn dns_start(&self, host: &str) {
        self.metrics.dns.record_start();
        self.stamps().dns = Some(Instant::now());
        self.delegate.dns_start(host);
    }

    fn dns_end(&self, host: &str, addresses: &[IpAddr]) {
        let started_at = self.stamps().dns.take();
        self.metrics.dns.record_end(started_at);
        self.delegate.dns_end(host, addresses);
    }

    fn connect_start(&self, address: SocketAddr) {
        self.metrics.connects.record_start();
        self.stamps().connect = Some(Instant::now());
        self.delegate.connect_start(address);
    }

    fn connect_end(&self, address: SocketAddr) {
        let started_at = self.stamps().connect.take();
        self.metrics.connects.record_end(started_at);
        self.delegate.connect_end(address);
    }

    fn connect_failed(&self, address: SocketAddr, error: &HttpError) {
        self.stamps().connect.take();
        self.metrics.connects.record_failed();
        self.delegate.connect_failed(address, error);
    }

    fn connection_acquired(&self, id: u64) {
        self.metrics.connections_acquired.inc();
        self.delegate.connection_acquired(id);
    }

    fn connection_released(&self, id: u64) {
        self.metrics.connections_released.inc();
        self.delegate.connection_released(id);
    }

    fn request_headers_start(&self) {
        self.metrics.request_headers.record_start();
        self.stamps().request_headers = Some(Instant::now());
        self.delegate.request_headers_start();
    }

    fn request_headers_end(&self, header_bytes: u64) {
        let started_at = self.stamps().request_headers.take();
        self.metrics.request_headers.record_end(started_at);
        self.delegate.request_headers_end(header_bytes);
    }

    fn request_body_start(&self) {
        self.metrics.request_body.record_start();
        self.stamps().request_body = Some(Instant::now());
        self.delegate.request_body_start();
    }

    fn request_body_end(&self, body_bytes: u64) {
        let started_at = self.stamps().request_body.take();
        self.metrics.request_body.record_end(started_at);
        self.delegate.request_body_end(body_bytes);
    }

    fn response_headers_start(&self) {
        self.metrics.response_headers.record_start();
        self.stamps().response_headers = Some(Instant::now());
        self.delegate.response_headers_start();
    }

    fn response_headers_end(&self, status: StatusCode) {
        let started_at = self.stamps().response_headers.take();
        self.metrics.response_headers.record_end(started_at);
        self.delegate.response_headers_end(status);
    }

    fn response_body_start(&self) {
        self.metrics.response_body.record_start();
        self.stamps().response_body = Some(Instant::now());
        self.delegate.response_body_start();
    }

    fn response_body_end(&self, body_bytes: u64) {
        let started_at = self.stamps().response_body.take();
        self.metrics.response_body.record_end(started_at);
        self.delegate.response_body_end(body_bytes);
    }

    fn call_end(&self) {
        let started_at = self.stamps().call.take();
        self.metrics.calls.record_end(started_at);
        self.delegate.call_end();
    }

    fn call_failed(&self, error: &HttpError) {
        self.stamps().call.take();
        self.metrics.calls.record_failed();
        self.delegate.call_failed(error);
    }
}

/// Factory wrapping the client's original factory.
///
/// Each call gets a fresh [`InstrumentedEventListener`] around a fresh
/// delegate from the wrapped factory, so delegate implementations keep their
/// own per-call semantics.
pub struct InstrumentedEventListenerFactory {
    metrics: Arc<ListenerMetrics>,
    delegate: Arc<dyn EventListenerFactory>,
}

impl InstrumentedEventListenerFactory {
    pub fn new(metrics: Arc<ListenerMetrics>, delegate: Arc<dyn EventListenerFactory>) -> Self {
        Self { metrics, delegate }
    }
}

impl EventListenerFactory for InstrumentedEventListenerFactory {
    fn create(&self, request: &Request) -> Box<dyn EventListener> {
        Box::new(InstrumentedEventListener {
            metrics: Arc::clone(&self.metrics),
            delegate: self.delegate.create(request),
            stamps: Mutex::default(),
        })
    }
}
