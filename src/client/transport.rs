//! Transport seam and the reqwest-backed production transport.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use crate::client::events::EventListener;
use crate::client::{Request, Response};
use crate::error::HttpError;

/// The network stack beneath the interceptor chain.
///
/// A transport executes one request and reports the lifecycle phases it can
/// observe to the per-call listener. Phases the transport cannot see must
/// not be faked: listeners rely on a reported phase having actually
/// happened.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(
        &self,
        request: Request,
        listener: &dyn EventListener,
    ) -> Result<Response, HttpError>;
}

/// Transport over a [`reqwest::Client`].
///
/// reqwest owns DNS resolution, connecting, and connection pooling behind
/// its API, so this transport emits only the request/response header and
/// body phases. The wrapped client's pool settings, timeouts, and TLS stack
/// all apply unchanged.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with a default reqwest client.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the client cannot be constructed,
    /// e.g. when the TLS backend fails to initialize.
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError::Transport { source: e.into() })?;
        Ok(Self { client })
    }

    /// Wrap an existing, already-configured reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: Request,
        listener: &dyn EventListener,
    ) -> Result<Response, HttpError> {
        let (parts, body) = request.into_parts();
        let url_text = parts.uri.to_string();
        let url: reqwest::Url = url_text.parse().map_err(|e| HttpError::InvalidUrl {
            url: url_text.clone(),
            source: Box::new(e),
        })?;

        let header_bytes: u64 = parts
            .headers
            .iter()
            .map(|(name, value)| (name.as_str().len() + value.len() + 4) as u64)
            .sum();
        let body_bytes = (!body.is_empty()).then(|| body.len() as u64);
        let mut builder = self.client.request(parts.method, url).headers(parts.headers);
        if body_bytes.is_some() {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(e, &url_text))?;

        // reqwest resolves `send` only after the request was written and the
        // full response header section arrived, so both the write phases and
        // the response-header phase are visible as point events here. A
        // failed send emits none of them: the write never happened.
        listener.request_headers_start();
        listener.request_headers_end(header_bytes);
        if let Some(body_bytes) = body_bytes {
            listener.request_body_start();
            listener.request_body_end(body_bytes);
        }

        listener.response_headers_start();
        let status = response.status();
        let headers = response.headers().clone();
        let version = response.version();
        listener.response_headers_end(status);

        listener.response_body_start();
        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| classify_error(e, &url_text))?;
        listener.response_body_end(body.len() as u64);

        let mut out = http::Response::new(body);
        *out.status_mut() = status;
        *out.headers_mut() = headers;
        *out.version_mut() = version;
        Ok(out)
    }
}

/// Classify a reqwest error without losing it: the original error always
/// rides along as the source.
fn classify_error(error: reqwest::Error, url: &str) -> HttpError {
    if error.is_timeout() {
        warn!(url, "request timed out");
        HttpError::Timeout {
            url: url.to_owned(),
            source: error.into(),
        }
    } else if error.is_connect() {
        warn!(url, "failed to connect");
        HttpError::ConnectionFailed {
            url: url.to_owned(),
            source: error.into(),
        }
    } else {
        HttpError::Transport {
            source: error.into(),
        }
    }
}
