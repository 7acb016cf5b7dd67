//! Metric registry wrapper.
//!
//! [`MeterRegistry`] wraps a [`prometheus_client::registry::Registry`] and
//! tracks every id registered through it. The underlying registry happily
//! accepts two metrics with the same name and then produces output a scraper
//! rejects, so duplicate registration is treated as a configuration error
//! here, at setup time, where the mistake was made.

use std::collections::HashSet;
use std::fmt;

use prometheus_client::collector::Collector;
use prometheus_client::encoding::text;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

use crate::error::InstrumentError;

/// Name-checked registry for counters, gauges, histograms, and read-through
/// gauge collectors.
///
/// Registration is idempotence-hostile on purpose: registering the same id
/// twice returns [`InstrumentError::NameCollision`] instead of silently
/// shadowing or duplicating the earlier metric.
#[derive(Default)]
pub struct MeterRegistry {
    registry: Registry,
    ids: HashSet<String>,
}

impl MeterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a counter. Encodes with a `_total` suffix per the OpenMetrics
    /// text format; the id passed here is the bare name.
    pub fn register_counter(
        &mut self,
        id: &str,
        help: &str,
        counter: Counter,
    ) -> Result<(), InstrumentError> {
        self.claim(id)?;
        self.registry.register(id, help, counter);
        Ok(())
    }

    /// Register a gauge.
    pub fn register_gauge(
        &mut self,
        id: &str,
        help: &str,
        gauge: Gauge,
    ) -> Result<(), InstrumentError> {
        self.claim(id)?;
        self.registry.register(id, help, gauge);
        Ok(())
    }

    /// Register a histogram.
    pub fn register_histogram(
        &mut self,
        id: &str,
        help: &str,
        histogram: Histogram,
    ) -> Result<(), InstrumentError> {
        self.claim(id)?;
        self.registry.register(id, help, histogram);
        Ok(())
    }

    /// Register a collector that computes gauge values at encode time.
    ///
    /// `ids` must list every metric name the collector will emit; they are
    /// claimed atomically so a collision leaves the registry untouched.
    pub fn register_collector(
        &mut self,
        ids: &[String],
        collector: Box<dyn Collector>,
    ) -> Result<(), InstrumentError> {
        self.ensure_vacant(ids)?;
        for id in ids {
            self.ids.insert(id.clone());
        }
        self.registry.register_collector(collector);
        Ok(())
    }

    /// Check that none of `ids` is registered yet.
    pub fn ensure_vacant(&self, ids: &[String]) -> Result<(), InstrumentError> {
        for id in ids {
            if self.ids.contains(id) {
                return Err(InstrumentError::NameCollision { id: id.clone() });
            }
        }
        Ok(())
    }

    /// Whether an id has been registered on this registry.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Encode the full registry in OpenMetrics text format.
    ///
    /// Gauge collectors are evaluated during this call, so the output always
    /// reflects live state.
    pub fn encode(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        text::encode(&mut out, &self.registry)?;
        Ok(out)
    }

    fn claim(&mut self, id: &str) -> Result<(), InstrumentError> {
        if !self.ids.insert(id.to_owned()) {
            return Err(InstrumentError::NameCollision { id: id.to_owned() });
        }
        Ok(())
    }
}
