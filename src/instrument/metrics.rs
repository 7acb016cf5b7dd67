//! Metric handles registered per instrumented client.
//!
//! One [`RequestMetrics`] set backs the interceptor, one [`ListenerMetrics`]
//! set backs the event-listener decorator. Both register every instrument up
//! front under [`crate::metric_id`] names so the full surface is visible on
//! the registry before the first request runs.

use std::sync::Arc;
use std::time::Instant;

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;

use crate::error::InstrumentError;
use crate::naming::metric_id;
use crate::registry::MeterRegistry;

/// Whole-call duration buckets, in seconds.
const CALL_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Phase duration buckets, in seconds. Phases (DNS, connect, header write)
/// are typically an order of magnitude shorter than whole calls.
const PHASE_DURATION_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
];

// ─────────────────────────────────────────────────────────────────────────────
// Request metrics (interceptor)
// ─────────────────────────────────────────────────────────────────────────────

/// Counters for the network-request interceptor.
pub struct RequestMetrics {
    /// Requests handed to the transport.
    pub submitted: Counter,
    /// Requests in flight right now. Never negative: only the guard that
    /// incremented it decrements it, exactly once.
    pub running: Gauge,
    /// Requests that finished, successfully or not.
    pub completed: Counter,
    /// Whole-call latency distribution in seconds.
    pub duration: Histogram,
}

impl RequestMetrics {
    /// Ids this set registers, for pre-flight collision checks.
    pub(crate) fn ids(name: Option<&str>) -> Vec<String> {
        [
            "network_requests_submitted",
            "network_requests_running",
            "network_requests_completed",
            "network_requests_duration",
        ]
        .iter()
        .map(|suffix| metric_id(name, suffix))
        .collect()
    }

    /// Create and register the full set.
    pub fn register(
        registry: &mut MeterRegistry,
        name: Option<&str>,
    ) -> Result<Self, InstrumentError> {
        let submitted = Counter::default();
        registry.register_counter(
            &metric_id(name, "network_requests_submitted"),
            "Network requests handed to the transport",
            submitted.clone(),
        )?;

        let running = Gauge::default();
        registry.register_gauge(
            &metric_id(name, "network_requests_running"),
            "Network requests currently in flight",
            running.clone(),
        )?;

        let completed = Counter::default();
        registry.register_counter(
            &metric_id(name, "network_requests_completed"),
            "Network requests that finished, successfully or not",
            completed.clone(),
        )?;

        let duration = Histogram::new(CALL_DURATION_BUCKETS.iter().copied());
        registry.register_histogram(
            &metric_id(name, "network_requests_duration"),
            "Network request latency in seconds",
            duration.clone(),
        )?;

        Ok(Self {
            submitted,
            running,
            completed,
            duration,
        })
    }
}

/// Drop-safe accounting guard for one request.
///
/// Starting the timer increments `submitted` and the in-flight gauge.
/// Finishing — explicitly or via `Drop`, which also covers unwinds and
/// cancelled futures — decrements the gauge, records the duration, and
/// increments `completed` exactly once. This is what keeps every submitted
/// request matched by exactly one completion, even on failure.
pub struct RequestTimer {
    metrics: Arc<RequestMetrics>,
    start: Instant,
    finished: bool,
}

impl RequestTimer {
    pub fn start(metrics: Arc<RequestMetrics>) -> Self {
        metrics.submitted.inc();
        metrics.running.inc();
        Self {
            metrics,
            start: Instant::now(),
            finished: false,
        }
    }

    /// Record completion now instead of at drop time.
    pub fn finish(mut self) {
        self.complete();
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.metrics.running.dec();
        self.metrics
            .duration
            .observe(self.start.elapsed().as_secs_f64());
        self.metrics.completed.inc();
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        self.complete();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listener metrics (event decorator)
// ─────────────────────────────────────────────────────────────────────────────

/// Counters and a duration histogram for one paired lifecycle phase.
pub struct PhaseMetrics {
    pub started: Counter,
    pub ended: Counter,
    /// Present only for phases that can fail (calls, connects).
    pub failed: Option<Counter>,
    pub duration: Histogram,
}

impl PhaseMetrics {
    fn register(
        registry: &mut MeterRegistry,
        name: Option<&str>,
        stem: &str,
        what: &str,
        with_failed: bool,
    ) -> Result<Self, InstrumentError> {
        let started = Counter::default();
        registry.register_counter(
            &metric_id(name, &format!("{stem}_start")),
            &format!("{what} phases started"),
            started.clone(),
        )?;

        let ended = Counter::default();
        registry.register_counter(
            &metric_id(name, &format!("{stem}_end")),
            &format!("{what} phases completed"),
            ended.clone(),
        )?;

        let failed = if with_failed {
            let failed = Counter::default();
            registry.register_counter(
                &metric_id(name, &format!("{stem}_failed")),
                &format!("{what} phases that failed"),
                failed.clone(),
            )?;
            Some(failed)
        } else {
            None
        };

        let buckets = if stem == "calls" {
            CALL_DURATION_BUCKETS
        } else {
            PHASE_DURATION_BUCKETS
        };
        let duration = Histogram::new(buckets.iter().copied());
        registry.register_histogram(
            &metric_id(name, &format!("{stem}_duration")),
            &format!("{what} phase duration in seconds"),
            duration.clone(),
        )?;

        Ok(Self {
            started,
            ended,
            failed,
            duration,
        })
    }

    pub(crate) fn record_start(&self) {
        self.started.inc();
    }

    /// Record the end of a phase. The duration is observed only when the
    /// matching start was seen by this listener instance.
    pub(crate) fn record_end(&self, started_at: Option<Instant>) {
        if let Some(start) = started_at {
            self.duration.observe(start.elapsed().as_secs_f64());
        }
        self.ended.inc();
    }

    pub(crate) fn record_failed(&self) {
        if let Some(failed) = &self.failed {
            failed.inc();
        }
    }
}

/// Metric handles for every lifecycle phase the event listener observes.
pub struct ListenerMetrics {
    pub calls: PhaseMetrics,
    pub dns: PhaseMetrics,
    pub connects: PhaseMetrics,
    pub request_headers: PhaseMetrics,
    pub request_body: PhaseMetrics,
    pub response_headers: PhaseMetrics,
    pub response_body: PhaseMetrics,
    pub connections_acquired: Counter,
    pub connections_released: Counter,
}

impl ListenerMetrics {
    pub(crate) fn ids(name: Option<&str>) -> Vec<String> {
        let mut ids = Vec::with_capacity(25);
        for (stem, with_failed) in [
            ("calls", true),
            ("dns", false),
            ("connections", true),
            ("request_headers", false),
            ("request_body", false),
            ("response_headers", false),
            ("response_body", false),
        ] {
            ids.push(metric_id(name, &format!("{stem}_start")));
            ids.push(metric_id(name, &format!("{stem}_end")));
            if with_failed {
                ids.push(metric_id(name, &format!("{stem}_failed")));
            }
            ids.push(metric_id(name, &format!("{stem}_duration")));
        }
        ids.push(metric_id(name, "connections_acquired"));
        ids.push(metric_id(name, "connections_released"));
        ids
    }

    pub fn register(
        registry: &mut MeterRegistry,
        name: Option<&str>,
    ) -> Result<Self, InstrumentError> {
        let calls = PhaseMetrics::register(registry, name, "calls", "Call", true)?;
        let dns = PhaseMetrics::register(registry, name, "dns", "DNS resolution", false)?;
        let connects = PhaseMetrics::register(registry, name, "connections", "Connect", true)?;
        let request_headers =
            PhaseMetrics::register(registry, name, "request_headers", "Request header", false)?;
        let request_body =
            PhaseMetrics::register(registry, name, "request_body", "Request body", false)?;
        let response_headers =
            PhaseMetrics::register(registry, name, "response_headers", "Response header", false)?;
        let response_body =
            PhaseMetrics::register(registry, name, "response_body", "Response body", false)?;

        let connections_acquired = Counter::default();
        registry.register_counter(
            &metric_id(name, "connections_acquired"),
            "Connections checked out for calls",
            connections_acquired.clone(),
        )?;
        let connections_released = Counter::default();
        registry.register_counter(
            &metric_id(name, "connections_released"),
            "Connections returned to the pool",
            connections_released.clone(),
        )?;

        Ok(Self {
            calls,
            dns,
            connects,
            request_headers,
            request_body,
            response_headers,
            response_body,
            connections_acquired,
            connections_released,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_metrics_register_their_declared_ids() {
        let mut registry = MeterRegistry::new();
        RequestMetrics::register(&mut registry, Some("api")).unwrap();
        for id in RequestMetrics::ids(Some("api")) {
            assert!(registry.contains(&id), "missing {id}");
        }
    }

    #[test]
    fn listener_metrics_register_their_declared_ids() {
        let mut registry = MeterRegistry::new();
        ListenerMetrics::register(&mut registry, None).unwrap();
        for id in ListenerMetrics::ids(None) {
            assert!(registry.contains(&id), "missing {id}");
        }
    }

    #[test]
    fn request_timer_matches_submitted_with_completed() {
        let mut registry = MeterRegistry::new();
        let metrics = Arc::new(RequestMetrics::register(&mut registry, None).unwrap());

        let timer = RequestTimer::start(Arc::clone(&metrics));
        assert_eq!(metrics.submitted.get(), 1);
        assert_eq!(metrics.running.get(), 1);
        assert_eq!(metrics.completed.get(), 0);

        timer.finish();
        assert_eq!(metrics.running.get(), 0);
        assert_eq!(metrics.completed.get(), 1);
    }

    #[test]
    fn dropped_timer_still_completes_once() {
        let mut registry = MeterRegistry::new();
        let metrics = Arc::new(RequestMetrics::register(&mut registry, None).unwrap());

        {
            let _timer = RequestTimer::start(Arc::clone(&metrics));
        }
        assert_eq!(metrics.submitted.get(), 1);
        assert_eq!(metrics.completed.get(), 1);
        assert_eq!(metrics.running.get(), 0);
    }

    #[test]
    fn phase_end_without_start_counts_but_records_no_duration() {
        let mut registry = MeterRegistry::new();
        let metrics = ListenerMetrics::register(&mut registry, None).unwrap();
        metrics.dns.record_end(None);
        assert_eq!(metrics.dns.ended.get(), 1);
        let text = registry.encode().unwrap();
        assert!(text.contains("http_client_dns_duration_count 0"));
    }
}
