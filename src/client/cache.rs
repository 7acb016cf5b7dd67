//! Read-only statistics view over the wrapped client's HTTP cache.

use std::io;

/// Statistics exposed by whatever response cache the host wired into the
/// client. The instrumentation layer only reads these; it never implements
/// caching itself.
///
/// All counters are cumulative since the cache was created.
pub trait HttpCache: Send + Sync {
    /// Requests that consulted the cache.
    fn request_count(&self) -> u64;

    /// Requests served from the cache.
    fn hit_count(&self) -> u64;

    /// Requests that required network use.
    fn network_count(&self) -> u64;

    /// Cache writes that completed.
    fn write_success_count(&self) -> u64;

    /// Cache writes that were abandoned.
    fn write_abort_count(&self) -> u64;

    /// Current store size in bytes. May fail if the backing store does, e.g.
    /// a disk cache whose directory became unreadable.
    fn size(&self) -> io::Result<u64>;

    /// Configured maximum store size in bytes.
    fn max_size(&self) -> u64;
}
