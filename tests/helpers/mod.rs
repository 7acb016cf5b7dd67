//! Shared helpers for the integration tests: a scriptable transport that
//! drives the full lifecycle-event sequence, fake cache/pool stat views, a
//! recording listener, and a parser for OpenMetrics text output.

#![allow(dead_code)] // Not every test file uses every helper.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use tokio::sync::Semaphore;

use metered_http::{
    ConnectionPool, EventListener, EventListenerFactory, HttpCache, HttpError, HttpTransport,
    Request, Response,
};

/// Install a test subscriber so the events the crate emits (connect
/// failures, unreadable cache sizes, instrumentation setup) surface under
/// `--nocapture`. Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Extract a sample value from OpenMetrics text output.
///
/// Matches lines whose first token is exactly `id` (so `foo_total` does not
/// match a query for `foo`). Returns `None` when the id never appears.
pub fn sample(text: &str, id: &str) -> Option<f64> {
    for line in text.lines() {
        if line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some(id) {
            return tokens.next().and_then(|v| v.parse().ok());
        }
    }
    None
}

/// In-memory transport that emits a scripted lifecycle-event sequence.
///
/// With `drive_network_phases` set it reports DNS, connect, and pool events
/// the way a transport with socket-level visibility would; otherwise it
/// emits only the header/body phases. An optional semaphore gates the
/// response so tests can observe a request while it is in flight.
#[derive(Default)]
pub struct ScriptedTransport {
    pub drive_network_phases: bool,
    pub fail_connect: bool,
    pub gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: Request,
        listener: &dyn EventListener,
    ) -> Result<Response, HttpError> {
        let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 443);
        if self.drive_network_phases {
            let host = request.uri().host().unwrap_or("localhost").to_owned();
            listener.dns_start(&host);
            listener.dns_end(&host, &[address.ip()]);
            listener.connect_start(address);
            if self.fail_connect {
                let error = HttpError::ConnectionFailed {
                    url: request.uri().to_string(),
                    source: io::Error::from(io::ErrorKind::ConnectionRefused).into(),
                };
                listener.connect_failed(address, &error);
                return Err(error);
            }
            listener.connect_end(address);
            listener.connection_acquired(1);
        }

        listener.request_headers_start();
        listener.request_headers_end(64);
        if !request.body().is_empty() {
            listener.request_body_start();
            listener.request_body_end(request.body().len() as u64);
        }

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate semaphore closed");
        }

        listener.response_headers_start();
        listener.response_headers_end(StatusCode::OK);
        listener.response_body_start();
        let body = Bytes::from_static(b"ok");
        listener.response_body_end(body.len() as u64);

        if self.drive_network_phases {
            listener.connection_released(1);
        }
        Ok(http::Response::new(body))
    }
}

/// Shared, appendable log of event names, used to check delegation order.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: &str) {
        self.0.lock().expect("event log poisoned").push(event.to_owned());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("event log poisoned").clone()
    }
}

/// Listener that records the name of every event it receives.
pub struct RecordingListener {
    log: EventLog,
}

impl EventListener for RecordingListener {
    fn call_start(&self, _request: &Request) {
        self.log.push("call_start");
    }
    fn dns_start(&self, _host: &str) {
        self.log.push("dns_start");
    }
    fn dns_end(&self, _host: &str, _addresses: &[IpAddr]) {
        self.log.push("dns_end");
    }
    fn connect_start(&self, _address: SocketAddr) {
        self.log.push("connect_start");
    }
    fn connect_end(&self, _address: SocketAddr) {
        self.log.push("connect_end");
    }
    fn connect_failed(&self, _address: SocketAddr, _error: &HttpError) {
        self.log.push("connect_failed");
    }
    fn connection_acquired(&self, _id: u64) {
        self.log.push("connection_acquired");
    }
    fn connection_released(&self, _id: u64) {
        self.log.push("connection_released");
    }
    fn request_headers_start(&self) {
        self.log.push("request_headers_start");
    }
    fn request_headers_end(&self, _header_bytes: u64) {
        self.log.push("request_headers_end");
    }
    fn request_body_start(&self) {
        self.log.push("request_body_start");
    }
    fn request_body_end(&self, _body_bytes: u64) {
        self.log.push("request_body_end");
    }
    fn response_headers_start(&self) {
        self.log.push("response_headers_start");
    }
    fn response_headers_end(&self, _status: StatusCode) {
        self.log.push("response_headers_end");
    }
    fn response_body_start(&self) {
        self.log.push("response_body_start");
    }
    fn response_body_end(&self, _body_bytes: u64) {
        self.log.push("response_body_end");
    }
    fn call_end(&self) {
        self.log.push("call_end");
    }
    fn call_failed(&self, _error: &HttpError) {
        self.log.push("call_failed");
    }
}

/// Factory producing [`RecordingListener`]s that all append to one log.
pub struct RecordingListenerFactory {
    pub log: EventLog,
}

impl EventListenerFactory for RecordingListenerFactory {
    fn create(&self, _request: &Request) -> Box<dyn EventListener> {
        Box::new(RecordingListener {
            log: self.log.clone(),
        })
    }
}

#[derive(Default)]
struct FakeCacheState {
    requests: AtomicU64,
    hits: AtomicU64,
    network: AtomicU64,
    write_successes: AtomicU64,
    write_aborts: AtomicU64,
    size: AtomicI64,
    max_size: AtomicU64,
    fail_size: AtomicBool,
}

/// Mutable cache stat view. The handle is `Clone`; tests keep one copy and
/// hand the other to the client builder, then mutate the stats live.
#[derive(Clone, Default)]
pub struct FakeCache {
    state: Arc<FakeCacheState>,
}

impl FakeCache {
    pub fn add_request(&self) {
        self.state.requests.fetch_add(1, Ordering::Relaxed);
    }
    pub fn add_hit(&self) {
        self.state.hits.fetch_add(1, Ordering::Relaxed);
    }
    pub fn add_network(&self) {
        self.state.network.fetch_add(1, Ordering::Relaxed);
    }
    pub fn add_write_success(&self) {
        self.state.write_successes.fetch_add(1, Ordering::Relaxed);
    }
    pub fn add_write_abort(&self) {
        self.state.write_aborts.fetch_add(1, Ordering::Relaxed);
    }
    pub fn set_size(&self, bytes: u64) {
        self.state.size.store(bytes as i64, Ordering::Relaxed);
    }
    pub fn set_max_size(&self, bytes: u64) {
        self.state.max_size.store(bytes, Ordering::Relaxed);
    }
    pub fn fail_size(&self) {
        self.state.fail_size.store(true, Ordering::Relaxed);
    }
}

impl HttpCache for FakeCache {
    fn request_count(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }
    fn hit_count(&self) -> u64 {
        self.state.hits.load(Ordering::Relaxed)
    }
    fn network_count(&self) -> u64 {
        self.state.network.load(Ordering::Relaxed)
    }
    fn write_success_count(&self) -> u64 {
        self.state.write_successes.load(Ordering::Relaxed)
    }
    fn write_abort_count(&self) -> u64 {
        self.state.write_aborts.load(Ordering::Relaxed)
    }
    fn size(&self) -> io::Result<u64> {
        if self.state.fail_size.load(Ordering::Relaxed) {
            return Err(io::Error::other("store unreadable"));
        }
        Ok(self.state.size.load(Ordering::Relaxed) as u64)
    }
    fn max_size(&self) -> u64 {
        self.state.max_size.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct FakePoolState {
    total: AtomicU64,
    idle: AtomicU64,
}

/// Mutable connection-pool occupancy view, cloneable like [`FakeCache`].
#[derive(Clone, Default)]
pub struct FakePool {
    state: Arc<FakePoolState>,
}

impl FakePool {
    pub fn set_connections(&self, total: u64, idle: u64) {
        self.state.total.store(total, Ordering::Relaxed);
        self.state.idle.store(idle, Ordering::Relaxed);
    }
}

impl ConnectionPool for FakePool {
    fn connection_count(&self) -> u64 {
        self.state.total.load(Ordering::Relaxed)
    }
    fn idle_connection_count(&self) -> u64 {
        self.state.idle.load(Ordering::Relaxed)
    }
}
