//! Metric id construction.
//!
//! Every metric this crate registers lives under a fixed `http_client`
//! namespace so that instrumented clients from multiple libraries can share
//! one registry without stepping on each other. An optional per-client name
//! is inserted between the namespace and the metric suffix, which keeps ids
//! distinct when the same process instruments more than one client.

/// Namespace prefix shared by every metric this crate registers.
pub const METRIC_PREFIX: &str = "http_client";

/// Build the registry id for a metric.
///
/// The id is `http_client[_<name>]_<suffix>`, lowercased, with every
/// character outside `[a-z0-9]` normalized to an underscore so the result is
/// always a valid Prometheus metric name. `None` and `Some("")` both produce the unnamed
/// form, which stays distinguishable from every named form because the
/// crate's metric suffixes never start with another suffix's tail.
///
/// Deterministic: the same `(name, suffix)` pair always yields the same id.
/// Ids are unique across distinct pairs as long as callers pick names that
/// do not themselves end in one of the registered suffixes.
pub fn metric_id(name: Option<&str>, suffix: &str) -> String {
    let name = name.filter(|n| !n.is_empty());
    let mut id = String::with_capacity(
        METRIC_PREFIX.len() + name.map_or(0, |n| n.len() + 1) + suffix.len() + 1,
    );
    id.push_str(METRIC_PREFIX);
    if let Some(name) = name {
        id.push('_');
        push_segment(&mut id, name);
    }
    id.push('_');
    push_segment(&mut id, suffix);
    id
}

fn push_segment(out: &mut String, segment: &str) {
    for ch in segment.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }
}
