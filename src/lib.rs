//! Passive runtime metrics for HTTP clients.
//!
//! This crate wraps an [`HttpClient`] with observers that publish request
//! accounting (submitted / in-flight / completed / duration), per-phase
//! lifecycle timings (DNS, connect, header and body transfer), cache
//! effectiveness gauges, and connection-pool occupancy gauges to a
//! [`MeterRegistry`]. Instrumentation is strictly read-only with respect to
//! request semantics: responses and errors pass through unchanged, and no
//! operation blocks beyond taking timestamps.
//!
//! # Usage
//!
//! ```no_run
//! use metered_http::{HttpClient, MeterRegistry, ReqwestTransport, instrument};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = MeterRegistry::new();
//! let client = HttpClient::new(ReqwestTransport::new()?);
//! let client = instrument(&mut registry, client, Some("api"))?;
//! // client.execute(...) is now counted and timed; registry.encode() scrapes.
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! All metric state is atomic; the instrumented client may be cloned and
//! driven from any number of tasks. Gauges are computed at encode time from
//! live client state, never cached.

pub mod client;
pub mod error;
pub mod instrument;
pub mod naming;
pub mod registry;

pub use client::cache::HttpCache;
pub use client::events::{EventListener, EventListenerFactory, NoopListener, NoopListenerFactory};
pub use client::interceptor::{Chain, Interceptor};
pub use client::pool::ConnectionPool;
pub use client::transport::{HttpTransport, ReqwestTransport};
pub use client::{HttpClient, HttpClientBuilder, Request, Response};
pub use error::{HttpError, InstrumentError};
pub use instrument::instrument;
pub use naming::{METRIC_PREFIX, metric_id};
pub use registry::MeterRegistry;
