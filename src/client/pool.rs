//! Read-only occupancy view over the wrapped client's connection pool.

/// Live occupancy of the connection pool backing a transport.
///
/// Both counts are computed by the pool at call time; nothing is cached on
/// this side.
pub trait ConnectionPool: Send + Sync {
    /// Total connections currently held by the pool, idle or in use.
    fn connection_count(&self) -> u64;

    /// Connections currently idle in the pool.
    fn idle_connection_count(&self) -> u64;
}
