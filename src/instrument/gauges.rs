//! Read-through gauges for the cache and the connection pool.
//!
//! These are collectors, not stored gauge values: every registry encode
//! queries the underlying cache/pool views at that moment, so concurrent
//! reads always see current state without any caching on this side.

use std::fmt;
use std::sync::Arc;

use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::gauge::ConstGauge;
use tracing::error;

use crate::client::cache::HttpCache;
use crate::client::pool::ConnectionPool;
use crate::error::InstrumentError;
use crate::naming::metric_id;
use crate::registry::MeterRegistry;

/// Sentinel reported when the cache's size query fails. Gauge reads have no
/// caller to propagate an error to.
const SIZE_UNAVAILABLE: i64 = -1;

pub(crate) fn cache_ids(name: Option<&str>) -> Vec<String> {
    [
        "cache_request_count",
        "cache_hit_count",
        "cache_network_count",
        "cache_write_success_count",
        "cache_write_abort_count",
        "cache_current_size",
        "cache_max_size",
        "cache_size",
    ]
    .iter()
    .map(|suffix| metric_id(name, suffix))
    .collect()
}

pub(crate) fn pool_ids(name: Option<&str>) -> Vec<String> {
    [
        "connection_pool_total_count",
        "connection_pool_idle_count",
    ]
    .iter()
    .map(|suffix| metric_id(name, suffix))
    .collect()
}

pub(crate) fn register_cache_gauges(
    registry: &mut MeterRegistry,
    name: Option<&str>,
    cache: Arc<dyn HttpCache>,
) -> Result<(), InstrumentError> {
    let collector = CacheGauges {
        name: name.map(str::to_owned),
        cache,
    };
    registry.register_collector(&cache_ids(name), Box::new(collector))
}

pub(crate) fn register_pool_gauges(
    registry: &mut MeterRegistry,
    name: Option<&str>,
    pool: Arc<dyn ConnectionPool>,
) -> Result<(), InstrumentError> {
    let collector = PoolGauges {
        name: name.map(str::to_owned),
        pool,
    };
    registry.register_collector(&pool_ids(name), Box::new(collector))
}

struct CacheGauges {
    name: Option<String>,
    cache: Arc<dyn HttpCache>,
}

impl fmt::Debug for CacheGauges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheGauges").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Collector for CacheGauges {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), fmt::Error> {
        let name = self.name.as_deref();

        encode_gauge(
            &mut encoder,
            &metric_id(name, "cache_request_count"),
            "Requests that consulted the cache",
            self.cache.request_count() as i64,
        )?;
        encode_gauge(
            &mut encoder,
            &metric_id(name, "cache_hit_count"),
            "Requests served from the cache",
            self.cache.hit_count() as i64,
        )?;
        encode_gauge(
            &mut encoder,
            &metric_id(name, "cache_network_count"),
            "Requests that required network use",
            self.cache.network_count() as i64,
        )?;
        encode_gauge(
            &mut encoder,
            &metric_id(name, "cache_write_success_count"),
            "Cache writes that completed",
            self.cache.write_success_count() as i64,
        )?;
        encode_gauge(
            &mut encoder,
            &metric_id(name, "cache_write_abort_count"),
            "Cache writes that were abandoned",
            self.cache.write_abort_count() as i64,
        )?;

        let current = match self.cache.size() {
            Ok(size) => size as i64,
            Err(err) => {
                error!(error = %err, "failed to read cache size");
                SIZE_UNAVAILABLE
            }
        };
        let max = self.cache.max_size();
        encode_gauge(
            &mut encoder,
            &metric_id(name, "cache_current_size"),
            "Current cache size in bytes, or -1 if unavailable",
            current,
        )?;
        encode_gauge(
            &mut encoder,
            &metric_id(name, "cache_max_size"),
            "Maximum cache size in bytes",
            max as i64,
        )?;

        // Utilization ratio, computed from the values read above rather than
        // re-queried, so the pair stays consistent within one encode.
        let ratio = if current >= 0 && max > 0 {
            current as f64 / max as f64
        } else {
            f64::NAN
        };
        let gauge = ConstGauge::new(ratio);
        let ratio_id = metric_id(name, "cache_size");
        let metric_encoder = encoder.encode_descriptor(
            &ratio_id,
            "Cache utilization as current/max",
            None,
            gauge.metric_type(),
        )?;
        gauge.encode(metric_encoder)?;

        Ok(())
    }
}

struct PoolGauges {
    name: Option<String>,
    pool: Arc<dyn ConnectionPool>,
}

impl fmt::Debug for PoolGauges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolGauges").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Collector for PoolGauges {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), fmt::Error> {
        let name = self.name.as_deref();
        encode_gauge(
            &mut encoder,
            &metric_id(name, "connection_pool_total_count"),
            "Connections currently held by the pool",
            self.pool.connection_count() as i64,
        )?;
        encode_gauge(
            &mut encoder,
            &metric_id(name, "connection_pool_idle_count"),
            "Connections currently idle in the pool",
            self.pool.idle_connection_count() as i64,
        )?;
        Ok(())
    }
}

fn encode_gauge(
    encoder: &mut DescriptorEncoder,
    id: &str,
    help: &str,
    value: i64,
) -> Result<(), fmt::Error> {
    let gauge = ConstGauge::new(value);
    let metric_encoder = encoder.encode_descriptor(id, help, None, gauge.metric_type())?;
    gauge.encode(metric_encoder)
}
