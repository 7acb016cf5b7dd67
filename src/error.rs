//! Error types.
//!
//! Call-path errors ([`HttpError`]) always preserve the underlying failure as
//! a source: the instrumentation layer observes requests, it never converts
//! or masks what the transport reported. Setup-path errors
//! ([`InstrumentError`]) are configuration mistakes and surface before any
//! request runs.

use thiserror::Error;

/// Boxed error preserving the transport's original failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while executing a request.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request did not complete within the transport's deadline.
    #[error("request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The transport could not establish a connection.
    #[error("failed to connect to {url}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The request URL could not be parsed by the transport.
    #[error("invalid request url: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: BoxError,
    },

    /// Any other transport-level failure.
    #[error("transport error")]
    Transport {
        #[source]
        source: BoxError,
    },
}

/// Errors raised while wiring instrumentation onto a client.
///
/// These are configuration errors: they fire when [`crate::instrument`] runs,
/// never on the request path.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// A metric id is already registered on this registry. Either the same
    /// client was instrumented twice or two clients share a name.
    #[error("metric id `{id}` is already registered")]
    NameCollision { id: String },
}
