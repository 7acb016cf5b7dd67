//! Wiring instrumentation onto a client.
//!
//! [`instrument`] is the entry point: it registers the metric surface,
//! rebuilds the client with the counting interceptor and the decorating
//! listener factory, and installs the cache/pool gauge collectors when the
//! client carries those views.

mod gauges;
mod interceptor;
mod listener;
mod metrics;

use std::sync::Arc;

use tracing::debug;

pub use interceptor::InstrumentedInterceptor;
pub use listener::{InstrumentedEventListener, InstrumentedEventListenerFactory};
pub use metrics::{ListenerMetrics, PhaseMetrics, RequestMetrics, RequestTimer};

use crate::client::HttpClient;
use crate::error::InstrumentError;
use crate::registry::MeterRegistry;

/// Wrap `client` so that request counts, in-flight occupancy, durations, and
/// lifecycle phase timings are published to `registry`.
///
/// The returned client behaves identically to the original: same transport,
/// same interceptors (the counting interceptor is appended after them, next
/// to the wire), same event delegation (the original listener factory keeps
/// receiving every event, after metrics are recorded), same cache and pool.
/// Cache gauges install only when the client carries a cache view, pool
/// gauges only when it carries a pool view.
///
/// `name` distinguishes multiple instrumented clients on one registry; see
/// [`crate::metric_id`] for the naming scheme.
///
/// # Errors
///
/// Returns [`InstrumentError::NameCollision`] when any metric id this call
/// would register already exists on the registry — typically the same
/// (registry, name) pair was instrumented twice. The check runs before
/// anything is registered, so a failed call leaves the registry unchanged.
pub fn instrument(
    registry: &mut MeterRegistry,
    client: HttpClient,
    name: Option<&str>,
) -> Result<HttpClient, InstrumentError> {
    let mut ids = RequestMetrics::ids(name);
    ids.extend(ListenerMetrics::ids(name));
    if client.cache().is_some() {
        ids.extend(gauges::cache_ids(name));
    }
    if client.connection_pool().is_some() {
        ids.extend(gauges::pool_ids(name));
    }
    registry.ensure_vacant(&ids)?;

    let request_metrics = Arc::new(RequestMetrics::register(registry, name)?);
    let listener_metrics = Arc::new(ListenerMetrics::register(registry, name)?);

    let delegate = Arc::clone(client.event_listener_factory());
    let client = client
        .to_builder()
        .add_interceptor(InstrumentedInterceptor::new(request_metrics))
        .event_listener_factory(InstrumentedEventListenerFactory::new(
            listener_metrics,
            delegate,
        ))
        .build();

    if let Some(cache) = client.cache() {
        gauges::register_cache_gauges(registry, name, Arc::clone(cache))?;
    }
    if let Some(pool) = client.connection_pool() {
        gauges::register_pool_gauges(registry, name, Arc::clone(pool))?;
    }

    debug!(name = name.unwrap_or_default(), "instrumented http client");
    Ok(client)
}
